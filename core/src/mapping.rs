use crate::{database::sql_type_wrapper::ColumnType, table::Table};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum MappingError {
    #[error("Column mapping refers to source column {0} which the record type does not have")]
    UnknownSourceColumn(String),

    #[error("Column mapping is empty, nothing would be copied")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMappingPair {
    pub source: String,
    pub destination: String,
}

/// A mapping pair resolved against a concrete [`Table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedColumn {
    pub source_index: usize,
    pub destination: String,
    pub column_type: ColumnType,
}

/// Correspondence between table columns and destination columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    pairs: Vec<ColumnMappingPair>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        ColumnMapping::default()
    }

    /// Maps every column of `table` to a destination column with the same name.
    pub fn from_table(table: &Table) -> Self {
        let pairs = table
            .columns()
            .iter()
            .map(|column| ColumnMappingPair {
                source: column.name.to_string(),
                destination: column.name.to_string(),
            })
            .collect();

        ColumnMapping { pairs }
    }

    pub fn add(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.pairs.push(ColumnMappingPair { source: source.into(), destination: destination.into() });
        self
    }

    pub fn pairs(&self) -> &[ColumnMappingPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn resolve(&self, table: &Table) -> Result<Vec<MappedColumn>, MappingError> {
        if self.pairs.is_empty() {
            return Err(MappingError::Empty);
        }

        self.pairs
            .iter()
            .map(|pair| {
                let source_index = table
                    .column_index(&pair.source)
                    .ok_or_else(|| MappingError::UnknownSourceColumn(pair.source.clone()))?;

                Ok(MappedColumn {
                    source_index,
                    destination: pair.destination.clone(),
                    column_type: table.columns()[source_index].column_type,
                })
            })
            .collect()
    }
}
