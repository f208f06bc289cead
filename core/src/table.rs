use crate::{
    database::sql_type_wrapper::{ColumnType, SqlTypeWrapper},
    record::{FieldDescriptor, Record},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl From<&FieldDescriptor> for Column {
    fn from(field: &FieldDescriptor) -> Self {
        Column { name: field.name, column_type: field.column_type, nullable: field.nullable }
    }
}

/// One projected record, holding a value for every column of its table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<SqlTypeWrapper>,
}

impl Row {
    pub fn values(&self) -> &[SqlTypeWrapper] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&SqlTypeWrapper> {
        self.values.get(index)
    }

    pub fn get<'a>(&'a self, columns: &[Column], name: &str) -> Option<&'a SqlTypeWrapper> {
        let index = columns.iter().position(|column| column.name == name)?;
        self.values.get(index)
    }
}

/// In-memory tabular form of a record collection.
///
/// Columns are the insertable fields of the record type in declaration order,
/// rows keep the order of the input records.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Table {
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&SqlTypeWrapper> {
        self.rows.get(row)?.get(&self.columns, column)
    }
}

/// Builds a [`Table`] from `records`, dropping every field marked as key or computed.
///
/// Columns are taken from the type's field descriptors, so an empty slice still
/// produces the full column list with no rows.
///
/// # Panics
///
/// Panics if a `Record` implementation returns a different number of values than
/// it declares fields, as the type's schema is then unusable.
pub fn project<T: Record>(records: &[T]) -> Table {
    let fields = T::fields();

    let insertable: Vec<usize> = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.is_insertable())
        .map(|(index, _)| index)
        .collect();

    let columns: Vec<Column> =
        insertable.iter().map(|index| Column::from(&fields[*index])).collect();

    let rows = records
        .iter()
        .map(|record| {
            let mut values = record.values();
            assert_eq!(
                values.len(),
                fields.len(),
                "Record {} declares {} fields but returned {} values",
                std::any::type_name::<T>(),
                fields.len(),
                values.len()
            );

            let values = insertable
                .iter()
                .map(|index| {
                    let placeholder = SqlTypeWrapper::Null(fields[*index].column_type);
                    std::mem::replace(&mut values[*index], placeholder)
                })
                .collect();

            Row { values }
        })
        .collect();

    Table { columns, rows }
}
