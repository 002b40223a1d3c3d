use anyhow::Result;
use std::fs;
use std::path::Path;
use survey_pipeline::app::survey_use_case::{check_columns, SurveyUseCase};
use survey_pipeline::config::OutputFiles;
use survey_pipeline::constants::*;
use survey_pipeline::infra::csv_table::{file_sha256, read_table};
use survey_pipeline::infra::output_adapter::FileOutputAdapter;
use survey_pipeline::pipeline::processing::clean::{FieldKind, FIELD_SPECS};
use survey_pipeline::pipeline::processing::indices::AnswerKey;
use tempfile::tempdir;

/// Writes a raw export with one respondent answering everything correctly
/// with neutral ratings and one answering everything wrong with no ratings.
fn write_raw_export(path: &Path) -> Result<()> {
    let key = AnswerKey::default();

    let mut headers = vec![
        "Carimbo de data/hora".to_string(),
        "Você concorda em participar da pesquisa?".to_string(),
    ];
    headers.extend(FIELD_SPECS.iter().map(|s| s.needles.join(" ")));
    headers.push("Se sim, informe seu e-mail".to_string());

    let respondent = |correct: bool| -> Vec<String> {
        let mut row = vec!["2024-05-01 10:00:00".to_string(), "Sim".to_string()];
        for spec in FIELD_SPECS {
            let value = match spec.canonical {
                PERFIL_CURSO if correct => "Ciência da Computação".to_string(),
                PERFIL_CURSO => "Engenharia de Software".to_string(),
                PERFIL_AREA_INTERESSE if correct => "Segurança da Informação".to_string(),
                PERFIL_AREA_INTERESSE => String::new(),
                PERFIL_SI_DISC_ATIV if correct => "Sim, através de disciplina".to_string(),
                PERFIL_SI_DISC_ATIV => "Não tive nenhuma".to_string(),
                field => match key.entries().iter().find(|(f, _)| f == field) {
                    Some((_, answer)) if correct => answer.clone(),
                    Some(_) => "Não sei".to_string(),
                    None if spec.kind == FieldKind::Ordinal && correct => "3".to_string(),
                    None => String::new(),
                },
            };
            row.push(value);
        }
        row.push("aluno@example.com".to_string());
        row
    };

    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&headers)?;
    wtr.write_record(respondent(true))?;
    wtr.write_record(respondent(false))?;
    wtr.flush()?;
    Ok(())
}

#[test]
fn test_full_run_writes_artifacts_and_manifest() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("respostas.csv");
    let output_dir = temp_dir.path().join("processed");
    write_raw_export(&input)?;

    let adapter = FileOutputAdapter::new(output_dir.clone(), OutputFiles::default());
    let use_case = SurveyUseCase::with_defaults(Box::new(adapter));

    let raw = read_table(&input)?;
    let result = use_case.run_all(&raw, Some(file_sha256(&input)?))?;
    assert_eq!(result.respondents, 2);
    assert_eq!(result.mapped_fields, FIELD_SPECS.len());
    assert_eq!(result.dropped_columns.len(), 3);

    for name in [
        CLEANED_FILE,
        CODEBOOK_FILE,
        INDEXED_FILE,
        GROUPED_FILE,
        INDEX_SUMMARY_FILE,
        GROUP_SUMMARY_FILE,
        MANIFEST_FILE,
    ] {
        assert!(output_dir.join(name).exists(), "missing {}", name);
    }

    // Sensitive columns never reach the outputs
    let cleaned = fs::read_to_string(output_dir.join(CLEANED_FILE))?;
    assert!(!cleaned.contains("aluno@example.com"));
    assert!(!cleaned.contains("2024-05-01 10:00:00"));

    let codebook = fs::read_to_string(output_dir.join(CODEBOOK_FILE))?;
    assert!(codebook.starts_with("coluna_original,coluna_no_dataset"));
    assert_eq!(codebook.lines().count(), FIELD_SPECS.len() + 1);

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(output_dir.join(MANIFEST_FILE))?)?;
    assert_eq!(manifest["respondents"], 2);
    assert_eq!(manifest["input_sha256"], file_sha256(&input)?);
    assert_eq!(manifest["artifacts"].as_array().map(|a| a.len()), Some(7));

    let indexed = read_table(&output_dir.join(INDEXED_FILE))?;
    let objective = indexed.column(IDX_CONHECIMENTO_OBJETIVO)?;
    assert_eq!(objective[0].as_number(), Some(5.0));
    assert_eq!(objective[1].as_number(), Some(0.0));
    for index in &INDEX_COLUMNS[1..] {
        let values = indexed.column(index)?;
        assert_eq!(values[0].as_number(), Some(3.0), "{}", index);
        assert!(values[1].is_absent(), "{}", index);
    }

    let grouped = read_table(&output_dir.join(GROUPED_FILE))?;
    let training = grouped.column(GRUPO_CURSOU_SI)?;
    assert_eq!(training[0].as_text(), Some("Sim"));
    assert_eq!(training[1].as_text(), Some("Não"));
    let area = grouped.column(GRUPO_AREA)?;
    assert_eq!(area[0].as_text(), Some("Segurança"));
    assert_eq!(area[1].as_text(), Some("Não informado"));

    Ok(())
}

#[test]
fn test_stages_rerun_from_written_files() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("respostas.csv");
    write_raw_export(&input)?;

    let first_dir = temp_dir.path().join("first");
    let use_case = SurveyUseCase::with_defaults(Box::new(FileOutputAdapter::new(
        first_dir.clone(),
        OutputFiles::default(),
    )));
    use_case.run_clean(&read_table(&input)?)?;

    // Multi-select answers come back as JSON arrays in text cells
    let cleaned = read_table(&first_dir.join(CLEANED_FILE))?;
    let indexed = use_case.run_indices(&cleaned)?;
    assert_eq!(
        indexed.table.column(IDX_CONHECIMENTO_OBJETIVO)?[0].as_number(),
        Some(5.0)
    );

    let reloaded = read_table(&first_dir.join(INDEXED_FILE))?;
    let grouped = use_case.run_groups(&reloaded)?;
    assert_eq!(grouped.groups.len(), 3);
    assert_eq!(
        grouped.table.column(GRUPO_CURSOU_SI)?[0].as_text(),
        Some("Sim")
    );

    let summary = use_case.run_describe(&reloaded)?;
    assert_eq!(summary.len(), INDEX_COLUMNS.len());
    assert_eq!(summary[0].count, 2);
    assert_eq!(summary[1].count, 1);

    let group_summary = fs::read_to_string(first_dir.join(GROUP_SUMMARY_FILE))?;
    assert!(group_summary.starts_with("group_column,group,index,count,mean,std"));
    assert!(group_summary.contains("grupo_curso,Ciência da Computação,idx_conhecimento_objetivo,1,5.0,"));

    Ok(())
}

#[test]
fn test_check_columns_reports_missing_field() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("respostas.csv");
    fs::write(&input, "Carimbo de data/hora,Consentimento,Qual sua idade?\n2024,Sim,21\n")?;

    let err = check_columns(&read_table(&input)?, DEFAULT_CONSENT_POSITION).unwrap_err();
    assert!(err.to_string().contains("perfil_genero"));
    Ok(())
}

#[test]
fn test_check_columns_writes_nothing() -> Result<()> {
    let temp_dir = tempdir()?;
    let input = temp_dir.path().join("respostas.csv");
    write_raw_export(&input)?;
    let output_dir = temp_dir.path().join("out");

    let use_case = SurveyUseCase::with_defaults(Box::new(FileOutputAdapter::new(
        output_dir.clone(),
        OutputFiles::default(),
    )));
    let resolutions = use_case.check_columns(&read_table(&input)?)?;
    assert_eq!(resolutions.len(), FIELD_SPECS.len());
    assert!(!output_dir.exists());

    // "idade" also matches the gender question, among others
    let age = resolutions
        .iter()
        .find(|r| r.spec.canonical == "perfil_idade")
        .expect("perfil_idade resolved");
    assert_eq!(age.header, "idade");
    assert!(age.alternatives.contains(&"identidade de gênero".to_string()));
    let os = resolutions
        .iter()
        .find(|r| r.spec.canonical == "perfil_so")
        .expect("perfil_so resolved");
    assert_eq!(os.alternatives, vec!["atualizo o sistema operacional".to_string()]);
    assert!(resolutions
        .iter()
        .find(|r| r.spec.canonical == "perfil_genero")
        .is_some_and(|r| r.is_unique()));
    Ok(())
}
