//! Statement descriptors.
//!
//! A descriptor records the intent of a pending statement, not its textual
//! layout; the renderer decides clause order. Descriptors are extended by
//! value through the chainable façade and are never mutated after being
//! handed to the renderer.

use std::str::FromStr;

use crate::error::ClientError;
use crate::query::predicate::Predicate;
use crate::value::Datum;

/// Sort direction for ORDER BY entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT OUTER JOIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub dataset: String,
    pub on: Predicate,
    pub kind: JoinKind,
}

/// Aggregate function applicable in a GROUP BY projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl Aggregate {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            Aggregate::Count => "COUNT",
            Aggregate::Sum => "SUM",
            Aggregate::Avg => "AVG",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
        }
    }

    pub(crate) fn suffix(self) -> &'static str {
        match self {
            Aggregate::Count => "count",
            Aggregate::Sum => "sum",
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
        }
    }
}

impl FromStr for Aggregate {
    type Err = ClientError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Ok(Aggregate::Count),
            "sum" => Ok(Aggregate::Sum),
            "avg" => Ok(Aggregate::Avg),
            "min" => Ok(Aggregate::Min),
            "max" => Ok(Aggregate::Max),
            other => Err(ClientError::QueryBuild(format!(
                "unknown aggregate function '{other}'"
            ))),
        }
    }
}

/// Descriptor for a pending SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectDescriptor {
    pub dataverse: Option<String>,
    pub dataset: String,
    /// Ordered projection; empty selects all fields.
    pub projection: Vec<String>,
    pub predicate: Option<Predicate>,
    pub joins: Vec<JoinClause>,
    pub group_by: Vec<String>,
    /// `(field, function)` pairs projected alongside the group keys.
    pub aggregates: Vec<(String, Aggregate)>,
    pub order_by: Vec<(String, Order)>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl SelectDescriptor {
    pub fn new(dataset: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            ..Self::default()
        }
    }

    /// Merge a predicate with any existing one via implicit AND.
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }
}

/// Scalar type tags accepted in a CREATE TYPE field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    String,
    Boolean,
    DateTime,
    Date,
    Time,
    Binary,
    Point,
    Uuid,
}

impl TypeTag {
    pub(crate) fn sql(self) -> &'static str {
        match self {
            TypeTag::TinyInt => "tinyint",
            TypeTag::SmallInt => "smallint",
            TypeTag::Int => "int",
            TypeTag::BigInt => "bigint",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::String => "string",
            TypeTag::Boolean => "boolean",
            TypeTag::DateTime => "datetime",
            TypeTag::Date => "date",
            TypeTag::Time => "time",
            TypeTag::Binary => "binary",
            TypeTag::Point => "point",
            TypeTag::Uuid => "uuid",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub type_tag: TypeTag,
    pub nullable: bool,
}

/// Record type definition for CREATE TYPE.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    /// Open types accept fields beyond the declared schema at write time.
    pub open: bool,
    pub fields: Vec<FieldDef>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, open: bool) -> Self {
        Self {
            name: name.into(),
            open,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, type_tag: TypeTag, nullable: bool) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            type_tag,
            nullable,
        });
        self
    }
}

/// Dataset definition for CREATE DATASET.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescriptor {
    pub name: String,
    pub datatype: String,
    /// Dotted field path uniquely identifying a record.
    pub primary_key: String,
    pub if_not_exists: bool,
}

impl DatasetDescriptor {
    pub fn new(
        name: impl Into<String>,
        datatype: impl Into<String>,
        primary_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            datatype: datatype.into(),
            primary_key: primary_key.into(),
            if_not_exists: false,
        }
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }
}

/// A complete statement ready for rendering. One template per shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectDescriptor),
    Insert {
        dataset: String,
        records: Vec<Datum>,
    },
    Upsert {
        dataset: String,
        records: Vec<Datum>,
    },
    Delete {
        dataset: String,
        predicate: Predicate,
    },
    CreateType {
        descriptor: TypeDescriptor,
        if_not_exists: bool,
    },
    CreateDataset(DatasetDescriptor),
    CreateDataverse {
        name: String,
        if_not_exists: bool,
    },
    DropDataverse {
        name: String,
        if_exists: bool,
    },
    DropType {
        name: String,
        if_exists: bool,
    },
    DropDataset {
        name: String,
        if_exists: bool,
    },
}
