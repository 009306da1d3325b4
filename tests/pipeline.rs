use std::{fs, path::Path};

use anyhow::Result;
use arrow::array::{Array, StringArray};
use police_ingest::{
    aggregate::missing_counts,
    export::ExportFormat,
    report::not_found_message,
    run,
    schema::{RecordType, UNKNOWN},
    Config,
};
use tempfile::tempdir;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,police_ingest=debug")),
        )
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn column(table: &arrow::record_batch::RecordBatch, name: &str) -> Vec<String> {
    table
        .column(table.schema().index_of(name).unwrap())
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
        .iter()
        .map(|v| v.unwrap().to_string())
        .collect()
}

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

const CRIME_HEADER: &str = "Crime ID,Month,Reported by,Falls within,Longitude,Latitude,Location,LSOA code,LSOA name,Crime type,Last outcome category,Context";

fn seed(root: &Path) {
    write(
        &root.join("2024-01/2024-01-metropolitan-street.csv"),
        &format!(
            "{}\n\
             a1,2024-01,Metropolitan Police Service,Metropolitan Police Service,-0.1,51.5,On or near Park Lane,E01000001,City of London 001A,Burglary,Under investigation,\n\
             ,2024-01,Metropolitan Police Service,Metropolitan Police Service,-0.2,51.4,On or near High Street,E01000002,City of London 001B,Anti-social behaviour,,\n",
            CRIME_HEADER
        ),
    );
    write(
        &root.join("2024-01/2024-01-metropolitan-stop-and-search.csv"),
        "Type ,Date,Part of a policing operation,Policing operation,Latitude,Longitude,Gender,Age range\n\
         Person search,2024-01-03T10:15:00+00:00,False,Operation Alpha,51.5,-0.1,Male,18-24\n\
         Vehicle search,2024-01-04T11:00:00+00:00,False,,,,Female,over 34\n",
    );
    write(
        &root.join("2024-02/2024-02-metropolitan-outcomes.csv"),
        "Month,Outcome type\n2024-02,Offender fined\n",
    );
    write(
        &root.join("2024-02/2024-02-metropolitan-stop-and-search.csv"),
        "Type,Latitude,Longitude\nPerson and Vehicle search,51.6,-0.3\n",
    );
    write(&root.join("2024-02/readme.txt"), "not tabular");
}

#[test]
fn end_to_end_run() -> Result<()> {
    init_test_logging();
    let dir = tempdir()?;
    seed(dir.path());

    let mut out = Vec::new();
    let summary = run(&Config::for_data_dir(dir.path()), &mut out)?;
    let text = String::from_utf8(out)?;

    assert_eq!(summary.loaded, 4);
    assert!(summary.missing.is_empty());
    assert!(summary.failed.is_empty());
    assert_eq!(summary.unclassified, vec!["2024-02_dataset_1"]);
    assert!(summary.rejected.is_empty());

    let crime = &summary.unified.crime;
    assert_eq!(crime.sources, 1);
    assert_eq!(crime.table.num_rows(), 2);
    assert_eq!(crime.table.num_columns(), 12);
    assert!(crime.mismatches.is_empty());

    let sas = &summary.unified.stop_and_search;
    assert_eq!(sas.sources, 2);
    assert_eq!(sas.table.num_rows(), 3);
    assert_eq!(sas.table.num_columns(), 14);
    assert!(sas.table.schema().index_of("Policing operation").is_err());
    let ids: Vec<&str> = sas.mismatches.iter().map(|m| m.dataset.as_str()).collect();
    assert_eq!(ids, vec!["2024-01_dataset_1", "2024-02_dataset_2"]);

    let types = sas
        .table
        .column(sas.table.schema().index_of("Type")?)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
        .iter()
        .map(|v| v.unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(
        types,
        vec!["Person search", "Vehicle search", "Person and Vehicle search"]
    );

    let gender = sas
        .table
        .column(sas.table.schema().index_of("Gender")?)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(gender.value(2), UNKNOWN);

    for record_type in RecordType::ALL {
        let table = &summary.unified.get(record_type).table;
        assert!(missing_counts(table).iter().all(|(_, n)| *n == 0));
        for col in table.columns() {
            assert_eq!(col.null_count(), 0);
        }
    }

    assert!(text.contains("Successfully loaded 4 dataset(s) across 2 time bucket(s)"));
    assert!(text.contains("COLUMN                    DATA TYPE       MEASUREMENT SCALE    SAMPLE VALUES"));
    assert!(text.contains("Analysis complete!"));
    assert!(!text.contains(&not_found_message(RecordType::Crime)));
    Ok(())
}

#[test]
fn empty_root_yields_empty_tables_without_failing() -> Result<()> {
    init_test_logging();
    let dir = tempdir()?;

    let mut out = Vec::new();
    let summary = run(&Config::for_data_dir(dir.path()), &mut out)?;
    let text = String::from_utf8(out)?;

    assert_eq!(summary.loaded, 0);
    for record_type in RecordType::ALL {
        let unified = summary.unified.get(record_type);
        assert!(unified.is_empty());
        assert_eq!(unified.table.num_rows(), 0);
        assert!(text.contains(&not_found_message(record_type)));
    }
    Ok(())
}

#[test]
fn missing_root_is_fatal() {
    init_test_logging();
    let dir = tempdir().unwrap();
    let mut out = Vec::new();
    let result = run(&Config::for_data_dir(dir.path().join("data")), &mut out);
    assert!(result.is_err());
    assert!(out.is_empty());
}

#[test]
fn export_writes_unified_tables() -> Result<()> {
    init_test_logging();
    let dir = tempdir()?;
    seed(dir.path());
    let export_dir = dir.path().join("out");

    let mut config = Config::for_data_dir(dir.path());
    config.export_dir = Some(export_dir.clone());
    config.export_format = ExportFormat::Csv;
    config.skip_profile = true;

    let mut out = Vec::new();
    let summary = run(&config, &mut out)?;

    assert_eq!(
        summary.exported,
        vec![
            export_dir.join("crime.csv"),
            export_dir.join("stop_and_search.csv"),
            export_dir.join("mismatches.json"),
        ]
    );
    let text = String::from_utf8(out)?;
    assert!(!text.contains("Analysis complete!"));
    Ok(())
}

#[test]
fn unified_cells_keep_source_text() -> Result<()> {
    init_test_logging();
    let dir = tempdir()?;
    write(
        &dir.path().join("2024-06/2024-06-kent-stop-and-search.csv"),
        "Type,Date,Latitude,Longitude\n\
         Person search,2024-06-01T12:00:00+01:00,51.50,0.5\n\
         Vehicle search,2024-06-02T08:30:00+01:00,51.25,-0.100\n\
         Person search,2024-06-03,,\n",
    );

    let mut config = Config::for_data_dir(dir.path());
    config.skip_profile = true;
    let summary = run(&config, &mut Vec::new())?;

    let sas = &summary.unified.stop_and_search.table;
    assert_eq!(
        column(sas, "Date"),
        vec![
            "2024-06-01T12:00:00+01:00",
            "2024-06-02T08:30:00+01:00",
            "2024-06-03"
        ]
    );
    assert_eq!(column(sas, "Latitude"), vec!["51.50", "51.25", UNKNOWN]);
    assert_eq!(column(sas, "Longitude"), vec!["0.5", "-0.100", UNKNOWN]);
    Ok(())
}

#[test]
fn colliding_headers_skip_only_that_dataset() -> Result<()> {
    init_test_logging();
    let dir = tempdir()?;
    write(
        &dir.path().join("2024-01/a-stop-and-search.csv"),
        "Type,Gender,Gender \nPerson search,,Male\n",
    );
    write(
        &dir.path().join("2024-01/b-stop-and-search.csv"),
        "Type,Gender\nVehicle search,Female\n",
    );

    let mut config = Config::for_data_dir(dir.path());
    config.skip_profile = true;
    let mut out = Vec::new();
    let summary = run(&config, &mut out)?;
    let text = String::from_utf8(out)?;

    assert_eq!(summary.loaded, 2);
    assert_eq!(summary.rejected, vec!["2024-01_dataset_1"]);
    let sas = &summary.unified.stop_and_search;
    assert_eq!(sas.sources, 1);
    assert_eq!(column(&sas.table, "Gender"), vec!["Female"]);
    assert!(text.contains("Skipped 2024-01_dataset_1: duplicate columns after stripping names [\"Gender\"]"));
    Ok(())
}
