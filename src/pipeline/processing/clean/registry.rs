use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

/// How a canonical field is normalized after renaming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free or single-choice profile text, kept as is
    Profile,
    /// Comma-separated multi-select answer
    MultiSelect,
    /// Fixed-answer knowledge question
    Objective,
    /// 1-5 Likert / frequency rating
    Ordinal,
    /// Open-ended answer
    OpenText,
}

/// Locates one canonical field among raw headers
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub canonical: &'static str,
    /// Every substring must appear in the header (case-insensitive)
    pub needles: &'static [&'static str],
    pub kind: FieldKind,
}

const fn spec(canonical: &'static str, needles: &'static [&'static str], kind: FieldKind) -> FieldSpec {
    FieldSpec { canonical, needles, kind }
}

use FieldKind::{MultiSelect, Objective, OpenText, Ordinal, Profile};

/// Canonical field registry, evaluated in order.
pub const FIELD_SPECS: &[FieldSpec] = &[
    // Profile
    spec("perfil_idade", &["idade"], Profile),
    spec("perfil_genero", &["identidade de gênero"], Profile),
    spec("perfil_curso", &["curso"], Profile),
    spec("perfil_periodo", &["período atual"], Profile),
    spec("perfil_lab_freq", &["frequência", "laboratórios"], Profile),
    spec("perfil_dispositivos", &["dispositivos que utiliza"], MultiSelect),
    spec("perfil_wifi_publico", &["já usou wi-fi"], Profile),
    spec("perfil_si_disc_ativ", &["disciplina", "segurança da informação"], MultiSelect),
    spec("perfil_ativ_ti", &["atividades abaixo", "ti"], MultiSelect),
    spec("perfil_contato_externo", &["contato", "fora da universidade"], MultiSelect),
    spec("perfil_incidente", &["incidente de segurança"], MultiSelect),
    spec("perfil_so", &["sistema operacional"], Profile),
    spec("perfil_tempo_uso", &["tempo médio"], Profile),
    spec("perfil_ouviu_termo", &["ouviu falar", "segurança da informação"], Profile),
    spec("perfil_autoavaliacao_ti", &["autoavaliação"], Profile),
    spec("perfil_area_interesse", &["com qual área da tecnologia"], Profile),
    spec("perfil_autoriza_contato", &["autoriza ser contatado"], Profile),
    // Objective knowledge (Q20-Q24)
    spec("obj_q20_senha_segura", &["qual destas senhas"], Objective),
    spec("obj_q21_phishing", &["o que é phishing"], Objective),
    spec("obj_q22_atualizacoes", &["importante manter", "atualiz"], Objective),
    spec("obj_q23_wifi_publica", &["forma mais segura", "wi-fi pública"], Objective),
    spec("obj_q24_pratica_senhas", &["melhor prática", "uso de senhas"], Objective),
    // Self-declared knowledge (Q25-Q30)
    spec("likert_q25_2fa", &["autenticação em dois fatores"], Ordinal),
    spec("likert_q26_link_suspeito", &["identificar um link suspeito"], Ordinal),
    spec("likert_q27_protecao_rede_publica", &["proteger meus dispositivos", "redes públicas"], Ordinal),
    spec("likert_q28_risco_desbloqueado", &["riscos", "desbloqueado"], Ordinal),
    spec("likert_q29_permissoes", &["configurar permissões", "google drive"], Ordinal),
    spec("likert_q30_compartilha_social", &["compartilhar informações pessoais"], Ordinal),
    // Risk perception (Q31-Q36)
    spec("risk_q31_vitima_golpes", &["posso ser vítima", "golpes"], Ordinal),
    spec("risk_q32_wifi_arriscado", &["arriscado utilizar redes wi-fi"], Ordinal),
    spec("risk_q33_receio_labs", &["receoso", "computadores dos laboratórios"], Ordinal),
    spec("risk_q34_receio_arquivos", &["colegas", "acessarem", "arquivos"], Ordinal),
    spec("risk_q35_medovazamento", &["dados pessoais", "vazados"], Ordinal),
    spec("risk_q36_evitacao", &["já evitei", "por medo"], Ordinal),
    // Awareness (Q37-Q42)
    spec("cons_q37_atualiza_so", &["atualizo o sistema operacional"], Ordinal),
    spec("cons_q38_nao_salva_senhas", &["evito deixar senhas salvas"], Ordinal),
    spec("cons_q39_senhas_diferentes", &["senhas diferentes"], Ordinal),
    spec("cons_q40_bloqueia_tela", &["bloqueio a tela"], Ordinal),
    spec("cons_q41_atento_golpes", &["atento", "golpes", "e-mails"], Ordinal),
    spec("cons_q42_logout_publico", &["logout", "computador público"], Ordinal),
    // Behaviour (Q43-Q50); Q43 is the protective item
    spec("beh_q43_evitar_compartilhar_dados", &["evito compartilhar meus dados pessoais"], Ordinal),
    spec("beh_q44_reutiliza_senha", &["mesma senha para diferentes sistemas"], Ordinal),
    spec("beh_q45_compartilha_senha", &["compartilho senhas com colegas"], Ordinal),
    spec("beh_q46_deixa_desbloqueado", &["deixo meu computador", "desbloqueado"], Ordinal),
    spec("beh_q47_conta_pessoal_pc_publico", &["acesso contas pessoais", "computadores públicos"], Ordinal),
    spec("beh_q48_wifi_sem_protecao", &["wi-fi abertas", "vpn"], Ordinal),
    spec("beh_q49_clica_link_duvidoso", &["cliquei em links", "origem duvidosa"], Ordinal),
    spec("beh_q50_compartilha_sem_verificar", &["compartilho arquivos", "sem verificar"], Ordinal),
    // Open questions (Q51-Q55)
    spec(
        "open_q51_motivos_inseguranca",
        &["por que você acredita que estudantes universitários adotam"],
        OpenText,
    ),
    spec("open_q52_orientacao_universidade", &["disciplina, palestra ou orientação"], OpenText),
    spec(
        "open_q53_dificuldade_pratica_segura",
        &["prática que você considera segura", "dificuldade"],
        OpenText,
    ),
    spec(
        "open_q54_melhorias_universidade",
        &["universidade contribui", "ambiente digital seguro"],
        OpenText,
    ),
    spec("open_q55_recursos_desejados", &["que tipo de orientação ou recurso"], OpenText),
];

/// Kind of a canonical field, if the registry knows it
pub fn field_kind(canonical: &str) -> Option<FieldKind> {
    FIELD_SPECS
        .iter()
        .find(|s| s.canonical == canonical)
        .map(|s| s.kind)
}

/// Positions of every header whose lower-cased text contains every needle,
/// in table order.
pub fn matching_columns(headers: &[String], needles: &[&str]) -> Vec<usize> {
    let needles_lower: Vec<String> = needles.iter().map(|n| n.to_lowercase()).collect();
    headers
        .iter()
        .enumerate()
        .filter(|(_, header)| {
            let name = header.to_lowercase();
            needles_lower.iter().all(|n| name.contains(n.as_str()))
        })
        .map(|(i, _)| i)
        .collect()
}

/// Position of the first header (in table order) whose lower-cased text
/// contains every needle.
pub fn resolve_column(headers: &[String], field: &str, needles: &[&str]) -> Result<usize> {
    matching_columns(headers, needles)
        .first()
        .copied()
        .ok_or_else(|| PipelineError::column_not_found(field, needles))
}

/// One resolved registry entry
#[derive(Debug, Clone)]
pub struct Resolution {
    pub spec: FieldSpec,
    pub position: usize,
    pub header: String,
    /// Later headers the rule also matches; the first match wins
    pub alternatives: Vec<String>,
}

impl Resolution {
    pub fn is_unique(&self) -> bool {
        self.alternatives.is_empty()
    }
}

/// Resolve every spec against `headers`.
///
/// Fails on the first field that matches no header, or when two fields
/// resolve to the same header (the mapping must be one-to-one). A field
/// matching more than one header resolves to the first and is reported
/// with its alternatives.
pub fn validate_registry(headers: &[String], specs: &[FieldSpec]) -> Result<Vec<Resolution>> {
    let mut claimed: HashMap<usize, &'static str> = HashMap::new();
    let mut resolutions = Vec::with_capacity(specs.len());

    for spec in specs {
        let matches = matching_columns(headers, spec.needles);
        let Some((&position, rest)) = matches.split_first() else {
            return Err(PipelineError::column_not_found(spec.canonical, spec.needles));
        };
        if let Some(other) = claimed.insert(position, spec.canonical) {
            return Err(PipelineError::AmbiguousColumn {
                header: headers[position].clone(),
                field: spec.canonical.to_string(),
                other: other.to_string(),
            });
        }
        let alternatives: Vec<String> = rest.iter().map(|&i| headers[i].clone()).collect();
        if alternatives.is_empty() {
            debug!(field = spec.canonical, header = %headers[position], "resolved column");
        } else {
            warn!(
                field = spec.canonical,
                header = %headers[position],
                alternatives = ?alternatives,
                "field matches more than one column, using the first"
            );
        }
        resolutions.push(Resolution {
            spec: *spec,
            position,
            header: headers[position].clone(),
            alternatives,
        });
    }

    Ok(resolutions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn registry_has_unique_canonical_names() {
        let names: HashSet<&str> = FIELD_SPECS.iter().map(|s| s.canonical).collect();
        assert_eq!(names.len(), FIELD_SPECS.len());
        assert!(FIELD_SPECS.iter().all(|s| !s.needles.is_empty()));
    }

    #[test]
    fn registry_group_sizes() {
        let count = |prefix: &str| {
            FIELD_SPECS
                .iter()
                .filter(|s| s.canonical.starts_with(prefix))
                .count()
        };
        assert_eq!(count("perfil_"), 17);
        assert_eq!(count("obj_"), 5);
        assert_eq!(count("likert_"), 6);
        assert_eq!(count("risk_"), 6);
        assert_eq!(count("cons_"), 6);
        assert_eq!(count("beh_"), 8);
        assert_eq!(count("open_"), 5);
    }

    #[test]
    fn resolves_first_match_case_insensitively() {
        let hs = headers(&["Qual a sua IDADE?", "Idade do curso"]);
        assert_eq!(resolve_column(&hs, "perfil_idade", &["idade"]).unwrap(), 0);
    }

    #[test]
    fn requires_all_needles() {
        let hs = headers(&[
            "Com que frequência você usa a biblioteca?",
            "Com que frequência você usa os Laboratórios?",
        ]);
        let pos = resolve_column(&hs, "perfil_lab_freq", &["frequência", "laboratórios"]).unwrap();
        assert_eq!(pos, 1);
    }

    #[test]
    fn missing_column_names_the_field() {
        let hs = headers(&["Nome"]);
        let err = resolve_column(&hs, "perfil_idade", &["idade"]).unwrap_err();
        match err {
            PipelineError::ColumnNotFound { field, needles } => {
                assert_eq!(field, "perfil_idade");
                assert_eq!(needles, vec!["idade".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn resolution_is_idempotent_on_canonical_headers() {
        let canonical: Vec<String> = FIELD_SPECS.iter().map(|s| s.canonical.to_string()).collect();
        for spec in FIELD_SPECS {
            let pos = resolve_column(&canonical, spec.canonical, &[spec.canonical]).unwrap();
            assert_eq!(canonical[pos], spec.canonical);
        }
        let resolutions = validate_registry(
            &canonical,
            &FIELD_SPECS
                .iter()
                .map(|s| FieldSpec {
                    needles: std::slice::from_ref(&s.canonical),
                    ..*s
                })
                .collect::<Vec<_>>(),
        )
        .unwrap();
        assert_eq!(resolutions.len(), FIELD_SPECS.len());
    }

    #[test]
    fn extra_matches_are_reported_as_alternatives() {
        let specs = [spec("perfil_idade", &["idade"], Profile)];
        let hs = headers(&["Qual sua identidade de gênero?", "Qual sua idade?"]);
        let resolutions = validate_registry(&hs, &specs).unwrap();
        assert_eq!(resolutions[0].position, 0);
        assert!(!resolutions[0].is_unique());
        assert_eq!(resolutions[0].alternatives, vec!["Qual sua idade?".to_string()]);
    }

    #[test]
    fn single_match_has_no_alternatives() {
        let specs = [spec("perfil_so", &["sistema operacional"], Profile)];
        let hs = headers(&["Qual sua idade?", "Qual sistema operacional você usa?"]);
        let resolutions = validate_registry(&hs, &specs).unwrap();
        assert!(resolutions[0].is_unique());
    }

    #[test]
    fn two_fields_on_one_header_is_ambiguous() {
        let specs = [
            spec("perfil_idade", &["idade"], Profile),
            spec("perfil_genero", &["identidade"], Profile),
        ];
        let hs = headers(&["Qual sua identidade de gênero?", "Qual sua idade?"]);
        let err = validate_registry(&hs, &specs).unwrap_err();
        assert!(matches!(err, PipelineError::AmbiguousColumn { .. }));
    }

    #[test]
    fn kind_lookup() {
        assert_eq!(field_kind("perfil_dispositivos"), Some(FieldKind::MultiSelect));
        assert_eq!(field_kind("beh_q44_reutiliza_senha"), Some(FieldKind::Ordinal));
        assert_eq!(field_kind("grupo_area"), None);
    }
}
