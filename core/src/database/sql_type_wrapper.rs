use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type as PgType};

/// The column types a record field can be projected into.
///
/// Each variant corresponds to exactly one PostgreSQL type so the binary COPY
/// writer can encode the value without any server round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Bool,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Text,
    Bytea,
    Numeric,
    Timestamp,
    TimestampTz,
    Date,
    Jsonb,
}

impl ColumnType {
    pub fn to_pg_type(&self) -> PgType {
        match self {
            ColumnType::Bool => PgType::BOOL,
            ColumnType::SmallInt => PgType::INT2,
            ColumnType::Integer => PgType::INT4,
            ColumnType::BigInt => PgType::INT8,
            ColumnType::Real => PgType::FLOAT4,
            ColumnType::Double => PgType::FLOAT8,
            ColumnType::Text => PgType::TEXT,
            ColumnType::Bytea => PgType::BYTEA,
            ColumnType::Numeric => PgType::NUMERIC,
            ColumnType::Timestamp => PgType::TIMESTAMP,
            ColumnType::TimestampTz => PgType::TIMESTAMPTZ,
            ColumnType::Date => PgType::DATE,
            ColumnType::Jsonb => PgType::JSONB,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Bool => "BOOL",
            ColumnType::SmallInt => "SMALLINT",
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Real => "REAL",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Text => "TEXT",
            ColumnType::Bytea => "BYTEA",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::TimestampTz => "TIMESTAMPTZ",
            ColumnType::Date => "DATE",
            ColumnType::Jsonb => "JSONB",
        }
    }
}

/// A single nullable cell value ready to be written to postgres.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlTypeWrapper {
    /// Explicit null marker, keeps the type of the column it belongs to.
    Null(ColumnType),
    Bool(bool),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Real(f32),
    Double(f64),
    Text(String),
    Bytea(Vec<u8>),
    Numeric(Decimal),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Jsonb(Value),
}

impl SqlTypeWrapper {
    pub fn column_type(&self) -> ColumnType {
        match self {
            SqlTypeWrapper::Null(column_type) => *column_type,
            SqlTypeWrapper::Bool(_) => ColumnType::Bool,
            SqlTypeWrapper::SmallInt(_) => ColumnType::SmallInt,
            SqlTypeWrapper::Integer(_) => ColumnType::Integer,
            SqlTypeWrapper::BigInt(_) => ColumnType::BigInt,
            SqlTypeWrapper::Real(_) => ColumnType::Real,
            SqlTypeWrapper::Double(_) => ColumnType::Double,
            SqlTypeWrapper::Text(_) => ColumnType::Text,
            SqlTypeWrapper::Bytea(_) => ColumnType::Bytea,
            SqlTypeWrapper::Numeric(_) => ColumnType::Numeric,
            SqlTypeWrapper::Timestamp(_) => ColumnType::Timestamp,
            SqlTypeWrapper::TimestampTz(_) => ColumnType::TimestampTz,
            SqlTypeWrapper::Date(_) => ColumnType::Date,
            SqlTypeWrapper::Jsonb(_) => ColumnType::Jsonb,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlTypeWrapper::Null(_))
    }

    pub fn to_type(&self) -> PgType {
        self.column_type().to_pg_type()
    }
}

impl ToSql for SqlTypeWrapper {
    fn to_sql(
        &self,
        ty: &PgType,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlTypeWrapper::Null(_) => Ok(IsNull::Yes),
            SqlTypeWrapper::Bool(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::SmallInt(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::Integer(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::BigInt(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::Real(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::Double(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::Text(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::Bytea(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::Numeric(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::Timestamp(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::TimestampTz(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::Date(value) => value.to_sql_checked(ty, out),
            SqlTypeWrapper::Jsonb(value) => value.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &PgType) -> bool {
        true // each variant checks the target type when encoding
    }

    to_sql_checked!();
}

/// Converts a record field into a cell value.
///
/// The associated constants describe the column the field produces, which lets
/// a record type declare its schema without ever holding an instance.
pub trait ToSqlValue {
    const COLUMN_TYPE: ColumnType;
    const NULLABLE: bool = false;

    fn to_sql_value(&self) -> SqlTypeWrapper;
}

macro_rules! impl_to_sql_value {
    ($rust_type:ty, $column_type:ident, |$value:ident| $convert:expr) => {
        impl ToSqlValue for $rust_type {
            const COLUMN_TYPE: ColumnType = ColumnType::$column_type;

            fn to_sql_value(&self) -> SqlTypeWrapper {
                let $value = self;
                SqlTypeWrapper::$column_type($convert)
            }
        }
    };
}

impl_to_sql_value!(bool, Bool, |value| *value);
impl_to_sql_value!(i16, SmallInt, |value| *value);
impl_to_sql_value!(i32, Integer, |value| *value);
impl_to_sql_value!(i64, BigInt, |value| *value);
impl_to_sql_value!(f32, Real, |value| *value);
impl_to_sql_value!(f64, Double, |value| *value);
impl_to_sql_value!(String, Text, |value| value.clone());
impl_to_sql_value!(&'static str, Text, |value| value.to_string());
impl_to_sql_value!(Vec<u8>, Bytea, |value| value.clone());
impl_to_sql_value!(Decimal, Numeric, |value| *value);
impl_to_sql_value!(NaiveDateTime, Timestamp, |value| *value);
impl_to_sql_value!(DateTime<Utc>, TimestampTz, |value| *value);
impl_to_sql_value!(NaiveDate, Date, |value| *value);
impl_to_sql_value!(Value, Jsonb, |value| value.clone());

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    const COLUMN_TYPE: ColumnType = T::COLUMN_TYPE;
    const NULLABLE: bool = true;

    fn to_sql_value(&self) -> SqlTypeWrapper {
        match self {
            Some(value) => value.to_sql_value(),
            None => SqlTypeWrapper::Null(T::COLUMN_TYPE),
        }
    }
}
