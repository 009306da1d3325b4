use std::{
    fs::File,
    io::{self, BufReader},
    path::Path,
    sync::Arc,
};

use arrow::{
    compute::concat_batches,
    csv::{reader::Format, ReaderBuilder},
    datatypes::{DataType, Field, Schema},
    error::ArrowError,
    record_batch::RecordBatch,
};
use tracing::debug;

use super::infer::apply_derived_types;
use crate::error::LoadError;

const BATCH_ROWS: usize = 8_192;

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    })
}

fn csv_error(path: &Path) -> impl Fn(ArrowError) -> LoadError + '_ {
    move |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Header names exactly as written in the file (no trimming).
fn read_headers(path: &Path) -> Result<Vec<String>, LoadError> {
    let file = open(path)?;
    let (schema, _) = Format::default()
        .with_header(true)
        .infer_schema(BufReader::new(file), Some(0))
        .map_err(csv_error(path))?;
    Ok(schema.fields().iter().map(|f| f.name().clone()).collect())
}

/// Read one CSV file with every column as utf8.
///
/// Header names and cell text are kept exactly as written. Empty cells become
/// null and short rows are padded with nulls.
pub fn read_raw_table(path: &Path) -> Result<RecordBatch, LoadError> {
    let headers = read_headers(path)?;
    if headers.is_empty() {
        return Err(LoadError::EmptyHeader(path.to_path_buf()));
    }

    let fields: Vec<Field> = headers
        .iter()
        .map(|n| Field::new(n, DataType::Utf8, true))
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let reader = ReaderBuilder::new(schema.clone())
        .with_header(true)
        .with_truncated_rows(true)
        .with_batch_size(BATCH_ROWS)
        .build(open(path)?)
        .map_err(csv_error(path))?;

    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_error(path))?;
    let raw = concat_batches(&schema, &batches).map_err(csv_error(path))?;
    debug!(
        path = %path.display(),
        rows = raw.num_rows(),
        columns = raw.num_columns(),
        "read csv"
    );
    Ok(raw)
}

/// Read one CSV file as `(raw, typed)`: the utf8 batch from
/// [`read_raw_table`] and a copy converted column by column to the type its
/// values agree on.
pub fn read_tables(path: &Path) -> Result<(RecordBatch, RecordBatch), LoadError> {
    let raw = read_raw_table(path)?;
    let typed = apply_derived_types(&raw).map_err(csv_error(path))?;
    Ok((raw, typed))
}

/// Read one CSV file into a typed batch.
pub fn read_csv_table(path: &Path) -> Result<RecordBatch, LoadError> {
    read_tables(path).map(|(_, typed)| typed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, StringArray};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn reads_typed_table_with_padded_short_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stop-and-search.csv");
        let mut f = File::create(&path).unwrap();
        writeln!(f, "Type,Date,Latitude,Gender").unwrap();
        writeln!(f, "Person search,2024-01-03T10:15:00+00:00,51.5,Male").unwrap();
        writeln!(f, "Vehicle search,2024-01-04T11:00:00+00:00,,").unwrap();
        writeln!(f, "Person search,2024-01-05T12:00:00+00:00").unwrap();
        drop(f);

        let batch = read_csv_table(&path).unwrap();
        assert_eq!(batch.num_rows(), 3);
        assert_eq!(batch.num_columns(), 4);

        let schema = batch.schema();
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert!(matches!(schema.field(1).data_type(), DataType::Timestamp(_, _)));
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);

        let gender = batch.column(3).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(gender.value(0), "Male");
        assert!(gender.is_null(1));
        assert!(gender.is_null(2));
    }

    #[test]
    fn raw_table_keeps_cell_text_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stop-and-search.csv");
        std::fs::write(
            &path,
            "Type,Date,Latitude\nPerson search,2024-06-01T12:00:00+01:00,51.50\nVehicle search,2024-06-02,\n",
        )
        .unwrap();

        let (raw, typed) = read_tables(&path).unwrap();
        assert!(raw
            .schema()
            .fields()
            .iter()
            .all(|f| f.data_type() == &DataType::Utf8));
        assert!(matches!(typed.schema().field(1).data_type(), DataType::Timestamp(_, _)));

        let date = raw.column(1).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(date.value(0), "2024-06-01T12:00:00+01:00");
        assert_eq!(date.value(1), "2024-06-02");
        let lat = raw.column(2).as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(lat.value(0), "51.50");
        assert!(lat.is_null(1));
    }

    #[test]
    fn header_whitespace_is_preserved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("crime.csv");
        std::fs::write(&path, "Crime ID , Month\nabc,2024-01\n").unwrap();

        let batch = read_csv_table(&path).unwrap();
        let names: Vec<String> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(names, vec!["Crime ID ", " Month"]);
    }

    #[test]
    fn missing_and_empty_files_are_typed_errors() {
        let dir = tempdir().unwrap();

        let absent = dir.path().join("absent.csv");
        assert!(matches!(
            read_csv_table(&absent),
            Err(LoadError::NotFound(_))
        ));

        let empty = dir.path().join("empty.csv");
        std::fs::write(&empty, "").unwrap();
        assert!(read_csv_table(&empty).is_err());
    }
}
