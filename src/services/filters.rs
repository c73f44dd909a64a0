//! Table-filter grammar used by the people listing.
//!
//! The client serializes its filter widget state into flat query keys
//! (`filters_name_value`, `filters_name_matchMode`,
//! `filters_dob_constraints_0_value`, ...). This module reassembles the
//! flat keys into per-field filters, normalizes match modes into SQL
//! operators and builds the WHERE/ORDER fragments with positional binds.

use indexmap::IndexMap;

use crate::error::{ApiError, ApiResult};

const ALLOWED_PERSON_FIELDS: &[&str] = &[
    "name",
    "dob",
    "dod",
    "nationality",
    "workcount",
    "storycount",
    "roles",
    "global",
];

/// One comparison: an operator already normalized by [`fix_operator`]
/// and the (possibly wildcard-wrapped) value to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    /// "and" / "or" between constraints; single-clause filters leave it unset.
    pub operator: Option<String>,
    pub clauses: Vec<FilterClause>,
}

#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub rows: Option<i64>,
    pub page: i64,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub filters: IndexMap<String, FieldFilter>,
}

/// Translate a client match mode into an SQL operator, wrapping the
/// value in wildcards where the mode implies them. Unknown modes are a
/// client bug and map to 405 like any other unsupported method.
pub fn fix_operator(operator: &str, value: Option<String>) -> ApiResult<(String, Option<String>)> {
    let op = match operator {
        "equals" => "eq",
        "notequals" => "ne",
        "startsWith" => return Ok(("ilike".into(), value.map(|v| format!("{v}%")))),
        "endsWith" => return Ok(("ilike".into(), value.map(|v| format!("%{v}")))),
        "contains" => return Ok(("ilike".into(), value.map(|v| format!("%{v}%")))),
        "notContains" => return Ok(("notContains".into(), value.map(|v| format!("%{v}%")))),
        "lt" => "lt",
        "lte" => "lte",
        "gt" => "gt",
        "gte" => "gte",
        "in" => "in",
        other => {
            return Err(ApiError::NotAllowed(format!(
                "Virheellinen operaattori {other}."
            )))
        }
    };
    Ok((op.to_string(), value))
}

#[derive(Debug, Default)]
struct RawConstraint {
    value: Option<String>,
    match_mode: Option<String>,
}

#[derive(Debug, Default)]
struct RawFilter {
    value: Option<String>,
    match_mode: Option<String>,
    operator: Option<String>,
    constraints: Vec<RawConstraint>,
}

/// Reassemble flat `filters_*` query keys into [`ListParams`].
/// `"null"` and `"undefined"` values mean "no value".
pub fn parse_list_params<'a, I>(query: I) -> ApiResult<ListParams>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut params = ListParams::default();
    let mut raw: IndexMap<String, RawFilter> = IndexMap::new();

    for (key, value) in query {
        let value = match value {
            "null" | "undefined" => None,
            v => Some(v.to_string()),
        };
        if let Some(rest) = key.strip_prefix("filters_") {
            let parts: Vec<&str> = rest.split('_').collect();
            if parts.len() < 2 {
                return Err(ApiError::BadRequest("Virheelliset parametrit.".into()));
            }
            let filter = raw.entry(parts[0].to_string()).or_default();
            match parts[1] {
                "constraints" if parts.len() == 4 => {
                    let idx: usize = parts[2]
                        .parse()
                        .map_err(|_| ApiError::BadRequest("Virheelliset parametrit.".into()))?;
                    while filter.constraints.len() <= idx {
                        filter.constraints.push(RawConstraint::default());
                    }
                    match parts[3] {
                        "value" => filter.constraints[idx].value = value,
                        "matchMode" => filter.constraints[idx].match_mode = value,
                        _ => {}
                    }
                }
                "value" => filter.value = value,
                "matchMode" => filter.match_mode = value,
                "operator" => filter.operator = value,
                _ => {}
            }
        } else {
            match key {
                "rows" => params.rows = value.and_then(|v| v.parse().ok()),
                "page" => params.page = value.and_then(|v| v.parse().ok()).unwrap_or(0),
                "sortField" => params.sort_field = value,
                "sortOrder" => params.sort_order = value,
                // `first` duplicates rows * page, `multiSortMeta` is unused.
                _ => {}
            }
        }
    }

    for (field, filter) in raw {
        let mut out = FieldFilter {
            operator: filter.operator,
            clauses: Vec::new(),
        };
        if let Some(mode) = filter.match_mode {
            let (op, value) = fix_operator(&mode, filter.value)?;
            if let Some(value) = value {
                out.clauses.push(FilterClause {
                    operator: op,
                    value,
                });
            }
        }
        for constraint in filter.constraints {
            if let Some(mode) = constraint.match_mode {
                let (op, value) = fix_operator(&mode, constraint.value)?;
                if let Some(value) = value {
                    out.clauses.push(FilterClause {
                        operator: op,
                        value,
                    });
                }
            }
        }
        params.filters.insert(field, out);
    }

    Ok(params)
}

/// WHERE / ORDER BY fragments with their bind values, ready for the
/// people repository to wrap in count and page queries.
#[derive(Debug, Default)]
pub struct PeopleQuery {
    pub where_sql: String,
    pub binds: Vec<String>,
    pub order_sql: String,
    pub limit: Option<i64>,
    pub offset: i64,
}

enum ColumnKind {
    Text,
    Integer,
}

fn column_expr(field: &str) -> Option<(&'static str, ColumnKind)> {
    match field {
        "name" | "global" => Some(("p.name", ColumnKind::Text)),
        "dob" => Some(("p.dob", ColumnKind::Integer)),
        "dod" => Some(("p.dod", ColumnKind::Integer)),
        "nationality" => Some((
            "(SELECT c.name FROM country c WHERE c.id = p.nationality_id)",
            ColumnKind::Text,
        )),
        "workcount" => Some((
            "(SELECT count(DISTINCT wc.work_id) FROM workcontributor wc \
              WHERE wc.person_id = p.id)",
            ColumnKind::Integer,
        )),
        "storycount" => Some((
            "(SELECT count(DISTINCT sc.shortstory_id) FROM storycontributor sc \
              WHERE sc.person_id = p.id)",
            ColumnKind::Integer,
        )),
        _ => None,
    }
}

fn clause_sql(expr: &str, kind: &ColumnKind, clause: &FilterClause, bind_pos: usize) -> ApiResult<String> {
    let bind = match kind {
        ColumnKind::Text => format!("${bind_pos}"),
        ColumnKind::Integer => format!("${bind_pos}::int"),
    };
    let sql = match clause.operator.as_str() {
        "eq" => format!("{expr} = {bind}"),
        "ne" => format!("{expr} <> {bind}"),
        "lt" => format!("{expr} < {bind}"),
        "lte" => format!("{expr} <= {bind}"),
        "gt" => format!("{expr} > {bind}"),
        "gte" => format!("{expr} >= {bind}"),
        "ilike" => format!("({expr})::text ILIKE ${bind_pos}"),
        "notContains" => format!("({expr})::text NOT ILIKE ${bind_pos}"),
        "in" => format!("({expr})::text = ANY(string_to_array(${bind_pos}, ','))"),
        other => {
            return Err(ApiError::NotAllowed(format!(
                "Virheellinen operaattori {other}."
            )))
        }
    };
    Ok(sql)
}

/// Build the people listing query from parsed parameters. Unknown filter
/// fields are rejected with 405. Partial birth/death years are padded to
/// four digits so "19" matches the whole century.
pub fn build_people_query(params: &ListParams) -> ApiResult<PeopleQuery> {
    let mut query = PeopleQuery::default();
    let mut conditions: Vec<String> = Vec::new();

    for (field, filter) in &params.filters {
        if !ALLOWED_PERSON_FIELDS.contains(&field.as_str()) {
            return Err(ApiError::NotAllowed(format!(
                "Virheellinen hakukenttä {field}."
            )));
        }
        if filter.clauses.is_empty() {
            continue;
        }
        let joiner = match filter.operator.as_deref() {
            Some("or") => " OR ",
            _ => " AND ",
        };
        let mut parts: Vec<String> = Vec::new();
        for clause in &filter.clauses {
            let mut value = clause.value.clone();
            if (field == "dob" || field == "dod") && value.len() < 4 {
                // "19" means the 1900s, not the year 19.
                while value.len() < 4 {
                    value.push('0');
                }
            }
            let sql = if field == "roles" {
                let bind_pos = query.binds.len() + 1;
                roles_clause(clause, bind_pos)?
            } else {
                let (expr, kind) = column_expr(field)
                    .ok_or_else(|| ApiError::NotAllowed(format!("Virheellinen hakukenttä {field}.")))?;
                clause_sql(expr, &kind, clause, query.binds.len() + 1)?
            };
            query.binds.push(value);
            parts.push(sql);
        }
        conditions.push(format!("({})", parts.join(joiner)));
    }

    if !conditions.is_empty() {
        query.where_sql = format!("WHERE {}", conditions.join(" AND "));
    }

    let (order_col, int_sort) = match params.sort_field.as_deref() {
        Some("dob") => ("p.dob", true),
        Some("dod") => ("p.dod", true),
        Some("nationality") => (
            "(SELECT c.name FROM country c WHERE c.id = p.nationality_id)",
            false,
        ),
        Some("workcount") => (
            "(SELECT count(DISTINCT wc.work_id) FROM workcontributor wc \
              WHERE wc.person_id = p.id)",
            true,
        ),
        Some("storycount") => (
            "(SELECT count(DISTINCT sc.shortstory_id) FROM storycontributor sc \
              WHERE sc.person_id = p.id)",
            true,
        ),
        _ => ("p.name", false),
    };
    // "1" sorts ascending; anything else, including a missing
    // sortOrder, sorts descending.
    let direction = match params.sort_order.as_deref() {
        Some("1") => "ASC",
        _ => "DESC",
    };
    // Nulls sort last regardless of direction so sparse year columns
    // keep real values on the first pages.
    query.order_sql = if int_sort {
        format!("ORDER BY {order_col} {direction} NULLS LAST, p.name ASC")
    } else {
        format!("ORDER BY {order_col} {direction}")
    };

    query.limit = params.rows;
    query.offset = params.rows.unwrap_or(0) * params.page.max(0);

    Ok(query)
}

fn roles_clause(clause: &FilterClause, bind_pos: usize) -> ApiResult<String> {
    let cmp = match clause.operator.as_str() {
        "eq" => format!("r.name = ${bind_pos}"),
        "ne" => format!("r.name <> ${bind_pos}"),
        "ilike" => format!("r.name ILIKE ${bind_pos}"),
        "notContains" => format!("r.name NOT ILIKE ${bind_pos}"),
        "in" => format!("r.name = ANY(string_to_array(${bind_pos}, ','))"),
        other => {
            return Err(ApiError::NotAllowed(format!(
                "Virheellinen operaattori {other}."
            )))
        }
    };
    Ok(format!(
        "EXISTS (SELECT 1 FROM contributorrole r WHERE {cmp} AND (\
           EXISTS (SELECT 1 FROM workcontributor x \
                   WHERE x.person_id = p.id AND x.role_id = r.id) OR \
           EXISTS (SELECT 1 FROM editioncontributor x \
                   WHERE x.person_id = p.id AND x.role_id = r.id) OR \
           EXISTS (SELECT 1 FROM storycontributor x \
                   WHERE x.person_id = p.id AND x.role_id = r.id)))"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fix_operator_wraps_wildcards() {
        assert_eq!(
            fix_operator("contains", Some("asimov".into())).unwrap(),
            ("ilike".into(), Some("%asimov%".into()))
        );
        assert_eq!(
            fix_operator("startsWith", Some("a".into())).unwrap(),
            ("ilike".into(), Some("a%".into()))
        );
        assert_eq!(
            fix_operator("equals", Some("x".into())).unwrap(),
            ("eq".into(), Some("x".into()))
        );
        assert_eq!(
            fix_operator("endsWith", None).unwrap(),
            ("ilike".into(), None)
        );
    }

    #[test]
    fn fix_operator_rejects_unknown_modes() {
        let err = fix_operator("between", Some("x".into())).unwrap_err();
        assert!(matches!(err, ApiError::NotAllowed(_)));
    }

    #[test]
    fn parse_reassembles_flat_keys() {
        let query = [
            ("first", "0"),
            ("rows", "50"),
            ("page", "2"),
            ("sortField", "name"),
            ("sortOrder", "1"),
            ("filters_global_value", "null"),
            ("filters_global_matchMode", "contains"),
            ("filters_name_operator", "and"),
            ("filters_name_constraints_0_value", "asimov"),
            ("filters_name_constraints_0_matchMode", "startsWith"),
        ];
        let params = parse_list_params(query).unwrap();
        assert_eq!(params.rows, Some(50));
        assert_eq!(params.page, 2);
        assert_eq!(params.sort_field.as_deref(), Some("name"));
        assert!(params.filters["global"].clauses.is_empty());
        assert_eq!(
            params.filters["name"].clauses,
            vec![FilterClause {
                operator: "ilike".into(),
                value: "asimov%".into(),
            }]
        );
    }

    #[test]
    fn build_rejects_unknown_fields() {
        let mut params = ListParams::default();
        params.filters.insert(
            "password".into(),
            FieldFilter {
                operator: None,
                clauses: vec![FilterClause {
                    operator: "eq".into(),
                    value: "x".into(),
                }],
            },
        );
        assert!(matches!(
            build_people_query(&params),
            Err(ApiError::NotAllowed(_))
        ));
    }

    #[test]
    fn build_pads_partial_years() {
        let mut params = ListParams::default();
        params.filters.insert(
            "dob".into(),
            FieldFilter {
                operator: None,
                clauses: vec![FilterClause {
                    operator: "gt".into(),
                    value: "19".into(),
                }],
            },
        );
        let query = build_people_query(&params).unwrap();
        assert_eq!(query.binds, vec!["1900".to_string()]);
        assert!(query.where_sql.contains("p.dob >"));
    }

    #[test]
    fn sort_defaults_to_descending() {
        let query = build_people_query(&ListParams::default()).unwrap();
        assert_eq!(query.order_sql, "ORDER BY p.name DESC");

        let params = ListParams {
            sort_order: Some("1".into()),
            ..Default::default()
        };
        let query = build_people_query(&params).unwrap();
        assert_eq!(query.order_sql, "ORDER BY p.name ASC");

        let params = ListParams {
            sort_order: Some("0".into()),
            ..Default::default()
        };
        let query = build_people_query(&params).unwrap();
        assert_eq!(query.order_sql, "ORDER BY p.name DESC");
    }

    #[test]
    fn build_computes_pagination_window() {
        let params = ListParams {
            rows: Some(20),
            page: 3,
            ..Default::default()
        };
        let query = build_people_query(&params).unwrap();
        assert_eq!(query.limit, Some(20));
        assert_eq!(query.offset, 60);
    }
}
