use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::*;

/// Ordinal fields averaged into one composite index
#[derive(Debug, Clone, Copy)]
pub struct IndexGroup {
    pub index: &'static str,
    pub fields: &'static [&'static str],
}

pub const CONHECIMENTO_DECLARADO: IndexGroup = IndexGroup {
    index: IDX_CONHECIMENTO_DECLARADO,
    fields: &[
        "likert_q25_2fa",
        "likert_q26_link_suspeito",
        "likert_q27_protecao_rede_publica",
        "likert_q28_risco_desbloqueado",
        "likert_q29_permissoes",
        "likert_q30_compartilha_social",
    ],
};

pub const PERCEPCAO_RISK: IndexGroup = IndexGroup {
    index: IDX_PERCEPCAO_RISK,
    fields: &[
        "risk_q31_vitima_golpes",
        "risk_q32_wifi_arriscado",
        "risk_q33_receio_labs",
        "risk_q34_receio_arquivos",
        "risk_q35_medovazamento",
        "risk_q36_evitacao",
    ],
};

/// Q43 is a protective behaviour, so it counts towards awareness
pub const CONSCIENTIZACAO: IndexGroup = IndexGroup {
    index: IDX_CONSCIENTIZACAO,
    fields: &[
        "cons_q37_atualiza_so",
        "cons_q38_nao_salva_senhas",
        "cons_q39_senhas_diferentes",
        "cons_q40_bloqueia_tela",
        "cons_q41_atento_golpes",
        "cons_q42_logout_publico",
        "beh_q43_evitar_compartilhar_dados",
    ],
};

pub const COMPORTAMENTO_INSEGURO: IndexGroup = IndexGroup {
    index: IDX_COMPORTAMENTO_INSEGURO,
    fields: &[
        "beh_q44_reutiliza_senha",
        "beh_q45_compartilha_senha",
        "beh_q46_deixa_desbloqueado",
        "beh_q47_conta_pessoal_pc_publico",
        "beh_q48_wifi_sem_protecao",
        "beh_q49_clica_link_duvidoso",
        "beh_q50_compartilha_sem_verificar",
    ],
};

/// Mean-based indices, in output order
pub const MEAN_INDEX_GROUPS: [IndexGroup; 4] = [
    CONHECIMENTO_DECLARADO,
    PERCEPCAO_RISK,
    CONSCIENTIZACAO,
    COMPORTAMENTO_INSEGURO,
];

/// Expected answers for the objective-knowledge questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerKey {
    entries: Vec<(String, String)>,
}

impl AnswerKey {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Default key with per-field overrides applied.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut key = Self::default();
        for (field, expected) in key.entries.iter_mut() {
            if let Some(answer) = overrides.get(field.as_str()) {
                *expected = answer.clone();
            }
        }
        key
    }
}

impl Default for AnswerKey {
    fn default() -> Self {
        Self::new(
            [
                (OBJ_SENHA_SEGURA, "@L1ne27329!"),
                (
                    OBJ_PHISHING,
                    "Um golpe digital que visa enganar usuários para obter dados sensíveis",
                ),
                (
                    OBJ_ATUALIZACOES,
                    "Para corrigir falhas de segurança que podem ser exploradas por atacantes",
                ),
                (
                    OBJ_WIFI_PUBLICA,
                    "Usar uma VPN ou protocolo HTTPS em todas as conexões",
                ),
                (
                    OBJ_PRATICA_SENHAS,
                    "Utilizar gerenciadores de senha e senhas únicas para cada serviço",
                ),
            ]
            .into_iter()
            .map(|(field, answer)| (field.to_string(), answer.to_string()))
            .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::clean::registry::{field_kind, FieldKind};

    #[test]
    fn group_sizes() {
        assert_eq!(CONHECIMENTO_DECLARADO.fields.len(), 6);
        assert_eq!(PERCEPCAO_RISK.fields.len(), 6);
        assert_eq!(CONSCIENTIZACAO.fields.len(), 7);
        assert_eq!(COMPORTAMENTO_INSEGURO.fields.len(), 7);
    }

    #[test]
    fn every_group_field_is_an_ordinal_registry_field() {
        for group in MEAN_INDEX_GROUPS {
            for field in group.fields {
                assert_eq!(field_kind(field), Some(FieldKind::Ordinal), "{field}");
            }
        }
    }

    #[test]
    fn answer_key_covers_objective_fields() {
        let key = AnswerKey::default();
        assert_eq!(key.entries().len(), 5);
        for (field, _) in key.entries() {
            assert_eq!(field_kind(field), Some(FieldKind::Objective), "{field}");
        }
    }

    #[test]
    fn overrides_replace_only_named_answers() {
        let overrides = BTreeMap::from([(OBJ_SENHA_SEGURA.to_string(), "outra".to_string())]);
        let key = AnswerKey::with_overrides(&overrides);
        assert_eq!(key.entries()[0].1, "outra");
        assert_eq!(key.entries()[1], AnswerKey::default().entries()[1]);
    }
}
