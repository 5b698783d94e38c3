//! Record descriptors and derived table schemas

use crate::value::{ConversionError, Value};
use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;

/// A type that maps onto a table row.
///
/// `fields` lists the mapped fields in declaration order; anything not listed
/// is unmapped. `Default` supplies the zero-valued instance rows are scanned
/// into.
pub trait Record: Default + 'static {
    /// Explicit table name. `None` derives it from the type name.
    const TABLE_NAME: Option<&'static str> = None;

    fn fields() -> Vec<FieldDescriptor<Self>>;
}

/// Maps one record field to one column.
pub struct FieldDescriptor<T> {
    name: &'static str,
    column: &'static str,
    get: fn(&T) -> std::result::Result<Value, ConversionError>,
    set: fn(&mut T, Value) -> std::result::Result<(), ConversionError>,
}

impl<T> FieldDescriptor<T> {
    /// Describe a field whose column carries the field's own name
    pub fn new(
        name: &'static str,
        get: fn(&T) -> std::result::Result<Value, ConversionError>,
        set: fn(&mut T, Value) -> std::result::Result<(), ConversionError>,
    ) -> Self {
        Self {
            name,
            column: name,
            get,
            set,
        }
    }

    /// Override the column name
    pub fn column(mut self, column: &'static str) -> Self {
        self.column = column;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn column_name(&self) -> &'static str {
        self.column
    }

    /// Read this field from a record
    pub fn get(&self, record: &T) -> std::result::Result<Value, ConversionError> {
        (self.get)(record)
    }

    /// Write a scanned value into this field
    pub fn set(&self, record: &mut T, value: Value) -> std::result::Result<(), ConversionError> {
        (self.set)(record, value)
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("column", &self.column)
            .finish()
    }
}

/// The derived column layout of a record type.
///
/// Field order is declaration order. Column lists, VALUES tuples and scan
/// targets all rely on this order lining up positionally.
#[derive(Debug)]
pub struct TableSchema<T> {
    name: String,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: Record> TableSchema<T> {
    /// Validate `T`'s descriptors and build its schema
    pub fn derive() -> Result<Self> {
        let name = T::TABLE_NAME
            .map(str::to_string)
            .unwrap_or_else(default_table_name::<T>);
        let invalid = |reason: String| Error::InvalidModel {
            model: std::any::type_name::<T>().to_string(),
            reason,
        };

        if name.is_empty() {
            return Err(invalid("table name is empty".to_string()));
        }

        let fields = T::fields();
        if fields.is_empty() {
            return Err(invalid("no mapped fields".to_string()));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.is_empty() || field.column.is_empty() {
                return Err(invalid("field or column name is empty".to_string()));
            }
            if !seen.insert(field.column) {
                return Err(invalid(format!("column {} is mapped twice", field.column)));
            }
        }

        Ok(Self { name, fields })
    }
}

impl<T> TableSchema<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.column.to_string()).collect()
    }

    /// Find a field by field name or column name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .or_else(|| self.fields.iter().find(|f| f.column == name))
    }

    /// A record's values in column order
    pub fn record_values(&self, record: &T) -> Result<Vec<Value>> {
        self.fields
            .iter()
            .map(|f| {
                f.get(record).map_err(|e| Error::Bind {
                    column: f.column.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

/// Last path segment of the type name, generic arguments dropped
fn default_table_name<T>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Implement [`Record`] for a struct from its list of mapped fields.
///
/// ```
/// #[derive(Debug, Default)]
/// struct User {
///     name: String,
///     age: i64,
///     cache_key: u64,
/// }
///
/// // `cache_key` is not listed, so it is not mapped.
/// lborm::record!(User as "users" { name, age => "user_age" });
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ident $(as $table:literal)? { $($field:ident $(=> $column:literal)?),+ $(,)? }) => {
        impl $crate::Record for $ty {
            const TABLE_NAME: Option<&'static str> = $crate::__record_table_name!($($table)?);

            fn fields() -> Vec<$crate::FieldDescriptor<Self>> {
                vec![
                    $(
                        $crate::FieldDescriptor::new(
                            stringify!($field),
                            |record: &Self| $crate::ToValue::to_value(&record.$field),
                            |record: &mut Self, value: $crate::Value| {
                                record.$field = $crate::FromValue::from_value(value)?;
                                Ok(())
                            },
                        )
                        $(.column($column))?
                    ),+
                ]
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_table_name {
    () => {
        None
    };
    ($table:literal) => {
        Some($table)
    };
}
