use arrow::datatypes::Schema;

use super::canonical::RecordType;

/// Marker column → record type, checked in order; first present marker wins.
pub const CLASSIFICATION_RULES: &[(&str, RecordType)] = &[
    ("Crime ID", RecordType::Crime),
    ("Type", RecordType::StopAndSearch),
];

/// `None` when the table carries none of the marker columns.
pub fn classify(schema: &Schema) -> Option<RecordType> {
    CLASSIFICATION_RULES
        .iter()
        .find(|(marker, _)| schema.fields().iter().any(|f| f.name() == marker))
        .map(|(_, record_type)| *record_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field};

    fn schema(names: &[&str]) -> Schema {
        Schema::new(
            names
                .iter()
                .map(|n| Field::new(*n, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn crime_id_marks_crime() {
        assert_eq!(
            classify(&schema(&["Month", "Crime ID", "Crime type"])),
            Some(RecordType::Crime)
        );
    }

    #[test]
    fn type_marks_stop_and_search() {
        assert_eq!(
            classify(&schema(&["Type", "Latitude", "Longitude"])),
            Some(RecordType::StopAndSearch)
        );
    }

    #[test]
    fn crime_id_wins_when_both_markers_exist() {
        assert_eq!(
            classify(&schema(&["Type", "Crime ID"])),
            Some(RecordType::Crime)
        );
    }

    #[test]
    fn unmarked_tables_are_unclassified() {
        assert_eq!(classify(&schema(&["Month", "Location"])), None);
        assert_eq!(classify(&schema(&[" Type"])), None);
    }
}
