//! Statement rendering.
//!
//! One fixed template per statement shape. The SELECT template is a
//! structural fold over an ordered list of clause emitters, so clauses
//! always appear in FROM/JOIN, WHERE, GROUP BY, ORDER BY, LIMIT, OFFSET
//! order no matter what order the builder calls happened in, and absent
//! clauses are omitted entirely.
//!
//! Identifiers are validated before substitution; operand values must
//! already be encoded by [`crate::query::encode`], so templates never
//! interpret data as control flow.

use crate::error::{ClientError, ClientResult};
use crate::query::descriptor::{
    Aggregate, DatasetDescriptor, SelectDescriptor, Statement, TypeDescriptor,
};
use crate::query::encode::encode;
use crate::query::predicate::{CompareOp, Predicate};

/// Render a completed statement to SQL++ text. Idempotent: the same
/// descriptor always yields identical text.
pub fn render(statement: &Statement) -> ClientResult<String> {
    match statement {
        Statement::Select(descriptor) => render_select(descriptor),
        Statement::Insert { dataset, records } => render_dml("INSERT", dataset, records),
        Statement::Upsert { dataset, records } => render_dml("UPSERT", dataset, records),
        Statement::Delete { dataset, predicate } => {
            validate_identifier(dataset)?;
            Ok(format!(
                "DELETE FROM {} WHERE {}",
                dataset,
                render_predicate(predicate)?
            ))
        }
        Statement::CreateType {
            descriptor,
            if_not_exists,
        } => render_create_type(descriptor, *if_not_exists),
        Statement::CreateDataset(descriptor) => render_create_dataset(descriptor),
        Statement::CreateDataverse {
            name,
            if_not_exists,
        } => {
            validate_identifier(name)?;
            let guard = if *if_not_exists { " IF NOT EXISTS" } else { "" };
            Ok(format!("CREATE DATAVERSE {name}{guard}"))
        }
        Statement::DropDataverse { name, if_exists } => render_drop("DATAVERSE", name, *if_exists),
        Statement::DropType { name, if_exists } => render_drop("TYPE", name, *if_exists),
        Statement::DropDataset { name, if_exists } => render_drop("DATASET", name, *if_exists),
    }
}

type ClauseFn = fn(&SelectDescriptor) -> ClientResult<Option<String>>;

/// Ordered clause emitters for the SELECT template.
const SELECT_CLAUSES: &[ClauseFn] = &[
    select_clause,
    from_clause,
    where_clause,
    group_by_clause,
    order_by_clause,
    limit_clause,
    offset_clause,
];

fn render_select(descriptor: &SelectDescriptor) -> ClientResult<String> {
    let mut parts = Vec::with_capacity(SELECT_CLAUSES.len());
    for clause in SELECT_CLAUSES {
        if let Some(text) = clause(descriptor)? {
            parts.push(text);
        }
    }
    Ok(parts.join(" "))
}

/// `SELECT COUNT(*) AS count` over the descriptor's FROM/JOIN/WHERE shape.
pub(crate) fn render_count(descriptor: &SelectDescriptor) -> ClientResult<String> {
    let mut parts = vec!["SELECT COUNT(*) AS count".to_string()];
    if let Some(from) = from_clause(descriptor)? {
        parts.push(from);
    }
    if let Some(filter) = where_clause(descriptor)? {
        parts.push(filter);
    }
    Ok(parts.join(" "))
}

fn select_clause(d: &SelectDescriptor) -> ClientResult<Option<String>> {
    let mut parts: Vec<String> = Vec::new();

    if !d.projection.is_empty() {
        for entry in &d.projection {
            validate_projection_entry(entry, d)?;
            parts.push(entry.clone());
        }
    } else if !d.group_by.is_empty() {
        // Group keys are the implicit projection of a grouped query.
        parts.extend(d.group_by.iter().cloned());
    }

    for (field, func) in &d.aggregates {
        if field == "*" {
            if *func != Aggregate::Count {
                return Err(ClientError::QueryBuild(format!(
                    "{}(*) is not a valid aggregate; only count applies to *",
                    func.suffix()
                )));
            }
            parts.push("COUNT(*) AS count".to_string());
        } else {
            validate_field_path(field)?;
            parts.push(format!(
                "{}({}) AS {}_{}",
                func.sql(),
                field,
                leaf_name(field),
                func.suffix()
            ));
        }
    }

    if parts.is_empty() {
        return Ok(Some("SELECT *".to_string()));
    }
    Ok(Some(format!("SELECT {}", parts.join(", "))))
}

fn from_clause(d: &SelectDescriptor) -> ClientResult<Option<String>> {
    validate_identifier(&d.dataset)?;
    let mut text = format!("FROM {}", d.dataset);
    for join in &d.joins {
        validate_identifier(&join.dataset)?;
        text.push_str(&format!(
            " {} {} ON {}",
            join.kind.sql(),
            join.dataset,
            render_predicate(&join.on)?
        ));
    }
    Ok(Some(text))
}

fn where_clause(d: &SelectDescriptor) -> ClientResult<Option<String>> {
    match &d.predicate {
        Some(predicate) => Ok(Some(format!("WHERE {}", render_predicate(predicate)?))),
        None => Ok(None),
    }
}

fn group_by_clause(d: &SelectDescriptor) -> ClientResult<Option<String>> {
    if d.group_by.is_empty() {
        return Ok(None);
    }
    for key in &d.group_by {
        validate_field_path(key)?;
    }
    Ok(Some(format!("GROUP BY {}", d.group_by.join(", "))))
}

fn order_by_clause(d: &SelectDescriptor) -> ClientResult<Option<String>> {
    if d.order_by.is_empty() {
        return Ok(None);
    }
    let mut entries = Vec::with_capacity(d.order_by.len());
    for (field, order) in &d.order_by {
        validate_field_path(field)?;
        // ASC is the engine default and stays implicit.
        entries.push(match order {
            crate::query::descriptor::Order::Asc => field.clone(),
            crate::query::descriptor::Order::Desc => format!("{} {}", field, order.sql()),
        });
    }
    Ok(Some(format!("ORDER BY {}", entries.join(", "))))
}

fn limit_clause(d: &SelectDescriptor) -> ClientResult<Option<String>> {
    Ok(d.limit.map(|n| format!("LIMIT {n}")))
}

fn offset_clause(d: &SelectDescriptor) -> ClientResult<Option<String>> {
    Ok(d.offset.map(|n| format!("OFFSET {n}")))
}

/// Render a predicate tree. Compound children are parenthesized so the
/// emitted text is unambiguous regardless of nesting.
pub(crate) fn render_predicate(predicate: &Predicate) -> ClientResult<String> {
    match predicate {
        Predicate::Compare { field, op, value } => {
            validate_field_path(field)?;
            if *op == CompareOp::In && !matches!(value, crate::value::Datum::Array(_)) {
                return Err(ClientError::QueryBuild(format!(
                    "IN predicate on '{field}' requires a list of values"
                )));
            }
            Ok(format!("{} {} {}", field, op.sql(), encode(value)?))
        }
        Predicate::FieldCompare { left, op, right } => {
            validate_field_path(left)?;
            validate_field_path(right)?;
            Ok(format!("{} {} {}", left, op.sql(), right))
        }
        Predicate::And(children) => join_compound(children, " AND "),
        Predicate::Or(children) => join_compound(children, " OR "),
        Predicate::Not(inner) => Ok(format!("NOT ({})", render_predicate(inner)?)),
        Predicate::IsNull(field) => {
            validate_field_path(field)?;
            Ok(format!("{field} IS NULL"))
        }
        Predicate::IsMissing(field) => {
            validate_field_path(field)?;
            Ok(format!("{field} IS MISSING"))
        }
        Predicate::IsUnknown(field) => {
            validate_field_path(field)?;
            Ok(format!("{field} IS UNKNOWN"))
        }
    }
}

fn join_compound(children: &[Predicate], separator: &str) -> ClientResult<String> {
    if children.is_empty() {
        return Err(ClientError::QueryBuild(
            "logical predicate has no operands".to_string(),
        ));
    }
    if children.len() == 1 {
        return render_predicate(&children[0]);
    }
    let mut parts = Vec::with_capacity(children.len());
    for child in children {
        let text = render_predicate(child)?;
        parts.push(match child {
            Predicate::And(_) | Predicate::Or(_) => format!("({text})"),
            _ => text,
        });
    }
    Ok(parts.join(separator))
}

fn render_dml(verb: &str, dataset: &str, records: &[crate::value::Datum]) -> ClientResult<String> {
    validate_identifier(dataset)?;
    if records.is_empty() {
        return Err(ClientError::QueryBuild(format!(
            "{} into '{dataset}' requires at least one record",
            verb.to_lowercase()
        )));
    }
    let encoded: Vec<String> = records.iter().map(encode).collect::<ClientResult<_>>()?;
    Ok(format!(
        "{} INTO {} ([{}])",
        verb,
        dataset,
        encoded.join(", ")
    ))
}

fn render_create_type(descriptor: &TypeDescriptor, if_not_exists: bool) -> ClientResult<String> {
    validate_identifier(&descriptor.name)?;
    let mut fields = Vec::with_capacity(descriptor.fields.len());
    for field in &descriptor.fields {
        validate_identifier(&field.name)?;
        let optional = if field.nullable { "?" } else { "" };
        fields.push(format!("{}: {}{}", field.name, field.type_tag.sql(), optional));
    }
    let guard = if if_not_exists { " IF NOT EXISTS" } else { "" };
    // Open is the engine default; only closed types are spelled out.
    let closedness = if descriptor.open { "" } else { "CLOSED " };
    Ok(format!(
        "CREATE TYPE{} {} AS {}{{ {} }}",
        guard,
        descriptor.name,
        closedness,
        fields.join(", ")
    ))
}

fn render_create_dataset(descriptor: &DatasetDescriptor) -> ClientResult<String> {
    validate_identifier(&descriptor.name)?;
    validate_field_path(&descriptor.datatype)?;
    validate_field_path(&descriptor.primary_key)?;
    let guard = if descriptor.if_not_exists {
        " IF NOT EXISTS"
    } else {
        ""
    };
    Ok(format!(
        "CREATE DATASET{} {}({}) PRIMARY KEY {}",
        guard, descriptor.name, descriptor.datatype, descriptor.primary_key
    ))
}

fn render_drop(kind: &str, name: &str, if_exists: bool) -> ClientResult<String> {
    validate_identifier(name)?;
    let guard = if if_exists { " IF EXISTS" } else { "" };
    Ok(format!("DROP {kind} {name}{guard}"))
}

/// Letters, digits and underscores, not digit-led.
pub(crate) fn validate_identifier(name: &str) -> ClientResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ClientError::Identifier(name.to_string()))
    }
}

/// A dotted field path; every segment must be a valid identifier.
pub(crate) fn validate_field_path(path: &str) -> ClientResult<()> {
    if path.is_empty() {
        return Err(ClientError::Identifier(path.to_string()));
    }
    for segment in path.split('.') {
        if validate_identifier(segment).is_err() {
            return Err(ClientError::Identifier(path.to_string()));
        }
    }
    Ok(())
}

/// Dotted projection entries must reference a bound alias: the base dataset
/// or one of the joined datasets.
fn validate_projection_entry(entry: &str, d: &SelectDescriptor) -> ClientResult<()> {
    validate_field_path(entry)?;
    if let Some((head, _)) = entry.split_once('.') {
        let bound = head == d.dataset || d.joins.iter().any(|j| j.dataset == head);
        if !bound {
            return Err(ClientError::QueryBuild(format!(
                "projection '{entry}' references unbound alias '{head}'"
            )));
        }
    }
    Ok(())
}

fn leaf_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::descriptor::{Order, TypeTag};
    use crate::query::predicate::field;

    #[test]
    fn identifier_grammar() {
        assert!(validate_identifier("Users").is_ok());
        assert!(validate_identifier("_tmp2").is_ok());
        assert!(validate_identifier("2fast").is_err());
        assert!(validate_identifier("user-name").is_err());
        assert!(validate_identifier("").is_err());
    }

    #[test]
    fn predicate_parenthesization() {
        let p = field("a")
            .eq(1)
            .or(field("b").eq(2))
            .and(field("c").eq(3));
        assert_eq!(
            render_predicate(&p).unwrap(),
            "(a = 1 OR b = 2) AND c = 3"
        );
    }

    #[test]
    fn not_wraps_inner_condition() {
        let p = field("status").eq("open").negate();
        assert_eq!(render_predicate(&p).unwrap(), "NOT (status = 'open')");
    }

    #[test]
    fn three_valued_predicates() {
        assert_eq!(
            render_predicate(&field("email").is_null()).unwrap(),
            "email IS NULL"
        );
        assert_eq!(
            render_predicate(&field("email").is_missing()).unwrap(),
            "email IS MISSING"
        );
        assert_eq!(
            render_predicate(&field("email").is_unknown()).unwrap(),
            "email IS UNKNOWN"
        );
    }

    #[test]
    fn create_type_open_and_closed() {
        let open = TypeDescriptor::new("UserType", true)
            .field("id", TypeTag::Int, false)
            .field("name", TypeTag::String, true);
        assert_eq!(
            render(&Statement::CreateType {
                descriptor: open,
                if_not_exists: false
            })
            .unwrap(),
            "CREATE TYPE UserType AS { id: int, name: string? }"
        );

        let closed = TypeDescriptor::new("Point2D", false)
            .field("x", TypeTag::Double, false)
            .field("y", TypeTag::Double, false);
        assert_eq!(
            render(&Statement::CreateType {
                descriptor: closed,
                if_not_exists: true
            })
            .unwrap(),
            "CREATE TYPE IF NOT EXISTS Point2D AS CLOSED { x: double, y: double }"
        );
    }

    #[test]
    fn create_dataset_with_guard() {
        let descriptor = DatasetDescriptor::new("Users", "UserType", "id").if_not_exists();
        assert_eq!(
            render(&Statement::CreateDataset(descriptor)).unwrap(),
            "CREATE DATASET IF NOT EXISTS Users(UserType) PRIMARY KEY id"
        );
    }

    #[test]
    fn drop_statements() {
        assert_eq!(
            render(&Statement::DropDataset {
                name: "Users".to_string(),
                if_exists: true
            })
            .unwrap(),
            "DROP DATASET Users IF EXISTS"
        );
        assert_eq!(
            render(&Statement::DropDataverse {
                name: "Social".to_string(),
                if_exists: false
            })
            .unwrap(),
            "DROP DATAVERSE Social"
        );
    }

    #[test]
    fn order_by_renders_desc_only() {
        let mut d = SelectDescriptor::new("Users");
        d.order_by.push(("name".to_string(), Order::Asc));
        d.order_by.push(("age".to_string(), Order::Desc));
        let text = render_select(&d).unwrap();
        assert_eq!(text, "SELECT * FROM Users ORDER BY name, age DESC");
    }
}
