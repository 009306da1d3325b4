use std::{collections::BTreeSet, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordType {
    Crime,
    StopAndSearch,
}

pub const CRIME_COLUMNS: [&str; 12] = [
    "Crime ID",
    "Month",
    "Reported by",
    "Falls within",
    "Longitude",
    "Latitude",
    "Location",
    "LSOA code",
    "LSOA name",
    "Crime type",
    "Last outcome category",
    "Context",
];

pub const STOP_AND_SEARCH_COLUMNS: [&str; 14] = [
    "Type",
    "Date",
    "Part of a policing operation",
    "Latitude",
    "Longitude",
    "Gender",
    "Age range",
    "Self-defined ethnicity",
    "Officer-defined ethnicity",
    "Legislation",
    "Object of search",
    "Outcome",
    "Outcome linked to object of search",
    "Removal of more than just outer clothing",
];

impl RecordType {
    pub const ALL: [RecordType; 2] = [RecordType::Crime, RecordType::StopAndSearch];

    pub fn canonical_columns(self) -> &'static [&'static str] {
        match self {
            RecordType::Crime => &CRIME_COLUMNS,
            RecordType::StopAndSearch => &STOP_AND_SEARCH_COLUMNS,
        }
    }

    pub fn canonical_set(self) -> BTreeSet<&'static str> {
        self.canonical_columns().iter().copied().collect()
    }

    /// File stem used when exporting the unified table.
    pub fn file_stem(self) -> &'static str {
        match self {
            RecordType::Crime => "crime",
            RecordType::StopAndSearch => "stop_and_search",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Crime => f.write_str("crime"),
            RecordType::StopAndSearch => f.write_str("stop-and-search"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_sets_have_no_duplicates() {
        assert_eq!(RecordType::Crime.canonical_set().len(), 12);
        assert_eq!(RecordType::StopAndSearch.canonical_set().len(), 14);
    }
}
