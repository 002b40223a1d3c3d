use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse bucket for the free-text interest-area answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MacroArea {
    Seguranca,
    QaTestes,
    UiUxDesign,
    DadosIa,
    InfraRedesDevops,
    GestaoProduto,
    Desenvolvimento,
    Outros,
    NaoInformado,
}

impl MacroArea {
    pub fn label(&self) -> &'static str {
        match self {
            MacroArea::Seguranca => "Segurança",
            MacroArea::QaTestes => "QA/Testes",
            MacroArea::UiUxDesign => "UI/UX & Design",
            MacroArea::DadosIa => "Dados/IA",
            MacroArea::InfraRedesDevops => "Infra/Redes/DevOps",
            MacroArea::GestaoProduto => "Gestão/Produto",
            MacroArea::Desenvolvimento => "Desenvolvimento",
            MacroArea::Outros => "Outros",
            MacroArea::NaoInformado => "Não informado",
        }
    }
}

impl fmt::Display for MacroArea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Answers that mean "nothing to classify"
const UNINFORMED: &[&str] = &["", "nan", "none", "não sei", "nao sei", "n/a", "null"];

/// Keyword rules, evaluated top to bottom; the first hit wins.
/// The order is part of the classification contract.
pub const MACRO_AREA_RULES: &[(MacroArea, &[&str])] = &[
    (
        MacroArea::Seguranca,
        &["segurança", "security", "ciber", "pentest", "soc", "blue team", "red team"],
    ),
    (
        MacroArea::QaTestes,
        &["qa", "teste", "testes", "tester", "automação", "automacao", "automation"],
    ),
    (
        MacroArea::UiUxDesign,
        &["ui", "ux", "ui/ux", "design", "product design", "designer"],
    ),
    (
        MacroArea::DadosIa,
        &[
            "dados",
            "data",
            "bi",
            "analytics",
            "cientista de dados",
            "machine learning",
            "ml",
            "ia",
            "ai",
        ],
    ),
    (
        MacroArea::InfraRedesDevops,
        &[
            "infra",
            "infraestrutura",
            "redes",
            "network",
            "devops",
            "devsecops",
            "cloud",
            "sre",
            "sysadmin",
        ],
    ),
    (
        MacroArea::GestaoProduto,
        &["produto", "product", "pm", "po", "gestão", "gestao", "gerente", "manager"],
    ),
    (
        MacroArea::Desenvolvimento,
        &[
            "dev",
            "developer",
            "desenvolv",
            "program",
            "backend",
            "frontend",
            "fullstack",
            "mobile",
            "software",
        ],
    ),
];

/// Outcome of a rule-based classification: the label, and whether it came
/// from a rule or from the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classified<T> {
    pub label: T,
    pub matched: bool,
}

impl<T> Classified<T> {
    fn rule(label: T) -> Self {
        Self { label, matched: true }
    }

    fn fallback(label: T) -> Self {
        Self { label, matched: false }
    }
}

/// Bucket an interest-area answer, reporting whether a rule matched.
pub fn classify_macro_area(raw: Option<&str>) -> Classified<MacroArea> {
    let text = raw
        .unwrap_or("")
        .trim()
        .to_lowercase()
        .replace("ui ux", "ui/ux")
        .replace("ux/ui", "ui/ux");

    if UNINFORMED.contains(&text.as_str()) {
        return Classified::rule(MacroArea::NaoInformado);
    }

    MACRO_AREA_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(area, _)| Classified::rule(*area))
        .unwrap_or(Classified::fallback(MacroArea::Outros))
}

/// Bucket an interest-area answer.
pub fn map_macro_area(raw: Option<&str>) -> MacroArea {
    classify_macro_area(raw).label
}

/// Whether the respondent had any information-security training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrainingStatus {
    Sim,
    Nao,
    NaoMeLembro,
}

impl TrainingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TrainingStatus::Sim => "Sim",
            TrainingStatus::Nao => "Não",
            TrainingStatus::NaoMeLembro => "Não me lembro",
        }
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify the security-training multi-select answer, reporting whether a
/// marker matched. Unmatched input defaults to `Não`.
pub fn classify_training(items: &[String]) -> Classified<TrainingStatus> {
    let joined = items
        .iter()
        .map(|item| item.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join(" | ");

    let has = |marker: &str| joined.contains(marker);

    let took_course = has("sim") && has("disciplina");
    let took_activity = (has("sim") && has("atividade")) || has("atividade complementar");
    let self_taught = has("autodidata");

    if took_course || took_activity || self_taught {
        Classified::rule(TrainingStatus::Sim)
    } else if has("não me lembro") || has("nao me lembro") {
        Classified::rule(TrainingStatus::NaoMeLembro)
    } else if has("não tive nenhuma") || has("nao tive nenhuma") {
        Classified::rule(TrainingStatus::Nao)
    } else {
        // TODO: split unparseable answers into their own bucket once the
        // survey owners confirm they are not true negatives.
        Classified::fallback(TrainingStatus::Nao)
    }
}

/// Classify the security-training multi-select answer.
pub fn classify_security_training(items: &[String]) -> TrainingStatus {
    classify_training(items).label
}
