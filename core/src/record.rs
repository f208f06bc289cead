use crate::database::sql_type_wrapper::{ColumnType, SqlTypeWrapper};

/// Static description of one field of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// Generated by the database, never sent on insert.
    pub is_computed: bool,
    /// Identity of the record, never sent on insert.
    pub is_key: bool,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        FieldDescriptor { name, column_type, nullable: false, is_computed: false, is_key: false }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn computed(mut self) -> Self {
        self.is_computed = true;
        self
    }

    pub const fn key(mut self) -> Self {
        self.is_key = true;
        self
    }

    pub fn is_insertable(&self) -> bool {
        !self.is_computed && !self.is_key
    }
}

/// A type that can be bulk copied into a table.
///
/// `fields` is the schema of the type in declaration order and `values` must
/// return exactly one value per field in that same order. Most types should
/// use [`bulk_record!`](crate::bulk_record) rather than implementing this by hand.
pub trait Record {
    fn fields() -> &'static [FieldDescriptor];

    fn values(&self) -> Vec<SqlTypeWrapper>;
}

/// Declares a struct and implements [`Record`](crate::Record) for it.
///
/// Fields can be marked with `#[key]` or `#[computed]` to keep them out of the
/// insert payload. Every field type must implement
/// [`ToSqlValue`](crate::ToSqlValue); wrapping it in `Option` makes the column
/// nullable.
///
/// # Example
///
/// ```
/// use bulkcopy::{bulk_record, Record};
///
/// bulk_record! {
///     #[derive(Debug, Clone)]
///     pub struct Score {
///         #[key]
///         pub id: i64,
///         pub name: String,
///         pub score: Option<i32>,
///         #[computed]
///         pub created_at: Option<i64>,
///     }
/// }
///
/// let insertable: Vec<&str> =
///     Score::fields().iter().filter(|f| f.is_insertable()).map(|f| f.name).collect();
/// assert_eq!(insertable, vec!["name", "score"]);
/// ```
#[macro_export]
macro_rules! bulk_record {
    (@key) => { false };
    (@key key $($rest:ident)*) => { true };
    (@key $other:ident $($rest:ident)*) => { $crate::bulk_record!(@key $($rest)*) };

    (@computed) => { false };
    (@computed computed $($rest:ident)*) => { true };
    (@computed $other:ident $($rest:ident)*) => { $crate::bulk_record!(@computed $($rest)*) };

    (
        $(#[$struct_meta:meta])*
        $struct_vis:vis struct $name:ident {
            $(
                $(#[$marker:ident])*
                $field_vis:vis $field:ident : $field_type:ty
            ),* $(,)?
        }
    ) => {
        $(#[$struct_meta])*
        $struct_vis struct $name {
            $($field_vis $field: $field_type,)*
        }

        impl $crate::Record for $name {
            fn fields() -> &'static [$crate::FieldDescriptor] {
                const FIELDS: &[$crate::FieldDescriptor] = &[
                    $(
                        $crate::FieldDescriptor {
                            name: stringify!($field),
                            column_type: <$field_type as $crate::ToSqlValue>::COLUMN_TYPE,
                            nullable: <$field_type as $crate::ToSqlValue>::NULLABLE,
                            is_computed: $crate::bulk_record!(@computed $($marker)*),
                            is_key: $crate::bulk_record!(@key $($marker)*),
                        },
                    )*
                ];
                FIELDS
            }

            fn values(&self) -> Vec<$crate::SqlTypeWrapper> {
                vec![$($crate::ToSqlValue::to_sql_value(&self.$field)),*]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::bulk_record! {
        #[derive(Debug, Clone)]
        struct Account {
            #[key]
            id: i32,
            email: String,
            #[computed]
            #[key]
            row_version: i64,
            balance: Option<f64>,
        }
    }

    #[test]
    fn test_macro_reads_markers() {
        let fields = Account::fields();

        assert_eq!(fields.len(), 4);
        assert!(fields[0].is_key && !fields[0].is_computed);
        assert!(fields[1].is_insertable());
        assert!(fields[2].is_key && fields[2].is_computed);
        assert!(fields[3].is_insertable());
    }

    #[test]
    fn test_macro_describes_column_types() {
        let fields = Account::fields();

        assert_eq!(fields[1].name, "email");
        assert_eq!(fields[1].column_type, ColumnType::Text);
        assert!(!fields[1].nullable);
        assert_eq!(fields[3].column_type, ColumnType::Double);
        assert!(fields[3].nullable);
    }

    #[test]
    fn test_values_follow_declaration_order() {
        let account =
            Account { id: 7, email: "a@b.c".to_string(), row_version: 3, balance: None };

        assert_eq!(
            account.values(),
            vec![
                SqlTypeWrapper::Integer(7),
                SqlTypeWrapper::Text("a@b.c".to_string()),
                SqlTypeWrapper::BigInt(3),
                SqlTypeWrapper::Null(ColumnType::Double),
            ]
        );
    }

    #[test]
    fn test_descriptor_builders() {
        let field = FieldDescriptor::new("id", ColumnType::BigInt).key();
        assert!(!field.is_insertable());

        let field = FieldDescriptor::new("total", ColumnType::Numeric).nullable().computed();
        assert!(field.nullable);
        assert!(!field.is_insertable());
    }
}
