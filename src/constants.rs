/// Canonical column names shared across stages.
/// Field identifiers are assigned by the cleaning registry; the ones below
/// are the names later stages depend on directly.

// Objective-knowledge questions (Q20-Q24)
pub const OBJ_SENHA_SEGURA: &str = "obj_q20_senha_segura";
pub const OBJ_PHISHING: &str = "obj_q21_phishing";
pub const OBJ_ATUALIZACOES: &str = "obj_q22_atualizacoes";
pub const OBJ_WIFI_PUBLICA: &str = "obj_q23_wifi_publica";
pub const OBJ_PRATICA_SENHAS: &str = "obj_q24_pratica_senhas";

// Profile fields read by the group classifier
pub const PERFIL_CURSO: &str = "perfil_curso";
pub const PERFIL_AREA_INTERESSE: &str = "perfil_area_interesse";
pub const PERFIL_SI_DISC_ATIV: &str = "perfil_si_disc_ativ";

// Derived index columns
pub const IDX_CONHECIMENTO_OBJETIVO: &str = "idx_conhecimento_objetivo";
pub const IDX_CONHECIMENTO_DECLARADO: &str = "idx_conhecimento_declarado";
pub const IDX_PERCEPCAO_RISK: &str = "idx_percepcao_risk";
pub const IDX_CONSCIENTIZACAO: &str = "idx_conscientizacao";
pub const IDX_COMPORTAMENTO_INSEGURO: &str = "idx_comportamento_inseguro";

/// All index columns, in the order they are appended to the table
pub const INDEX_COLUMNS: [&str; 5] = [
    IDX_CONHECIMENTO_OBJETIVO,
    IDX_CONHECIMENTO_DECLARADO,
    IDX_PERCEPCAO_RISK,
    IDX_CONSCIENTIZACAO,
    IDX_COMPORTAMENTO_INSEGURO,
];

// Group columns
pub const GRUPO_CURSO: &str = "grupo_curso";
pub const GRUPO_AREA: &str = "grupo_area";
pub const GRUPO_CURSOU_SI: &str = "grupo_cursou_si";

// Default file names (relative to the output directory)
pub const DEFAULT_INPUT: &str = "data/raw/respostas.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed";
pub const CLEANED_FILE: &str = "respostas_clean.csv";
pub const CODEBOOK_FILE: &str = "codebook.csv";
pub const INDEXED_FILE: &str = "respostas_indices.csv";
pub const GROUPED_FILE: &str = "respostas_grupos.csv";
pub const INDEX_SUMMARY_FILE: &str = "resumo_indices.csv";
pub const GROUP_SUMMARY_FILE: &str = "resumo_grupos.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Structural position of the consent column in the raw export
pub const DEFAULT_CONSENT_POSITION: usize = 1;
