//! Query-string filter evaluation over JSON rows

use serde_json::Value;

/// One parsed filter: column plus an `op.value` token
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub op: String,
    pub operand: String,
}

impl Filter {
    /// Parse `column=op.value`; returns `None` for reserved parameters
    pub fn parse(column: &str, token: &str) -> Option<Self> {
        if matches!(column, "select" | "order" | "limit" | "on_conflict") {
            return None;
        }
        let (op, operand) = token.split_once('.')?;
        Some(Self {
            column: column.to_string(),
            op: op.to_string(),
            operand: operand.to_string(),
        })
    }

    pub fn matches(&self, row: &Value) -> bool {
        let cell = row.get(&self.column).unwrap_or(&Value::Null);
        match self.op.as_str() {
            "eq" => compare(cell, &self.operand) == Some(std::cmp::Ordering::Equal),
            "neq" => compare(cell, &self.operand) != Some(std::cmp::Ordering::Equal),
            "gt" => compare(cell, &self.operand) == Some(std::cmp::Ordering::Greater),
            "gte" => matches!(
                compare(cell, &self.operand),
                Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
            ),
            "lt" => compare(cell, &self.operand) == Some(std::cmp::Ordering::Less),
            "lte" => matches!(
                compare(cell, &self.operand),
                Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal)
            ),
            "like" => pattern_match(&text(cell), &self.operand, false),
            "ilike" => pattern_match(&text(cell), &self.operand, true),
            "in" => {
                let list = self
                    .operand
                    .trim_start_matches('(')
                    .trim_end_matches(')');
                if list.is_empty() {
                    return false;
                }
                list.split(',')
                    .any(|v| compare(cell, v.trim()) == Some(std::cmp::Ordering::Equal))
            }
            "is" => match self.operand.as_str() {
                "null" => cell.is_null(),
                "true" => cell == &Value::Bool(true),
                "false" => cell == &Value::Bool(false),
                _ => false,
            },
            _ => false,
        }
    }
}

/// Compare a JSON cell against a wire-format operand
///
/// Numeric when both sides parse as numbers, lexicographic otherwise
/// (timestamps in RFC 3339 order correctly under string comparison).
fn compare(cell: &Value, operand: &str) -> Option<std::cmp::Ordering> {
    if cell.is_null() {
        return None;
    }
    if let Some(n) = cell.as_f64() {
        if let Ok(rhs) = operand.parse::<f64>() {
            return n.partial_cmp(&rhs);
        }
    }
    if let Some(b) = cell.as_bool() {
        if let Ok(rhs) = operand.parse::<bool>() {
            return Some(b.cmp(&rhs));
        }
    }
    Some(text(cell).as_str().cmp(operand))
}

fn text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// SQL LIKE with `%` wildcards only
fn pattern_match(haystack: &str, pattern: &str, fold_case: bool) -> bool {
    let (haystack, pattern) = if fold_case {
        (haystack.to_lowercase(), pattern.to_lowercase())
    } else {
        (haystack.to_string(), pattern.to_string())
    };

    let pieces: Vec<&str> = pattern.split('%').collect();
    if pieces.len() == 1 {
        return haystack == pattern;
    }

    let mut rest = haystack.as_str();
    // Anchored prefix unless the pattern starts with %
    if let Some(first) = pieces.first() {
        if !first.is_empty() {
            match rest.strip_prefix(first) {
                Some(r) => rest = r,
                None => return false,
            }
        }
    }
    // Anchored suffix unless the pattern ends with %
    let last = pieces.last().copied().unwrap_or("");
    let middle = &pieces[1..pieces.len() - 1];
    for piece in middle {
        if piece.is_empty() {
            continue;
        }
        match rest.find(piece) {
            Some(at) => rest = &rest[at + piece.len()..],
            None => return false,
        }
    }
    if last.is_empty() {
        true
    } else {
        rest.ends_with(last)
    }
}

/// Sort rows in place by an `order=column.dir` token
pub fn sort_rows(rows: &mut [Value], order: &str) {
    let (column, dir) = order.split_once('.').unwrap_or((order, "asc"));
    let descending = dir == "desc";
    rows.sort_by(|a, b| {
        let lhs = a.get(column).unwrap_or(&Value::Null);
        let rhs = b.get(column).unwrap_or(&Value::Null);
        let ord = match (lhs.as_f64(), rhs.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            _ => text(lhs).cmp(&text(rhs)),
        };
        if descending { ord.reverse() } else { ord }
    });
}
