use crate::{Cond, CondLeaf, Op, Params, Query, Value, embed, separated_by};

/// Renders queries and statements for one SQL dialect.
///
/// Every method appends to `out`; none performs I/O. Compilation is
/// deterministic: the same `(Query, Params)` pair always yields the same
/// bytes.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Operator template table, `{0}`/`{1}`/`{2}` = field/param1/param2.
    fn op_template(&self, op: Op) -> &'static str {
        match op {
            Op::Nop => "",
            Op::Eq => "{0} = {1}",
            Op::Ne => "{0} <> {1}",
            Op::Lt => "{0} < {1}",
            Op::Gt => "{0} > {1}",
            Op::Le => "{0} <= {1}",
            Op::Ge => "{0} >= {1}",
            Op::In => "{0} in ({1})",
            Op::NotIn => "{0} not in ({1})",
            Op::Between => "{0} between {1} and {2}",
            Op::Starts => "{0} like '{1}%'",
            Op::Ends => "{0} like '%{1}'",
            Op::Contains => "{0} like '%{1}%'",
            Op::IsNull => "{0} is null",
            Op::NotNull => "{0} is not null",
            Op::And => " AND ",
            Op::Or => " OR ",
        }
    }

    fn write_select(&self, out: &mut String, query: &Query, params: &Params, lock: bool) {
        out.push_str("select ");
        separated_by(
            out,
            query.fields.iter(),
            |out, (name, _)| out.push_str(name),
            ", ",
        );
        out.push_str(" from ");
        out.push_str(&query.table);
        self.write_where(out, &query.conditions, params);
        if !query.sort.is_empty() {
            out.push_str(" order by ");
            separated_by(out, query.sort.iter(), |out, v| out.push_str(v), ", ");
        }
        if query.page_lines > 0 {
            let mut buffer = itoa::Buffer::new();
            out.push_str(" limit ");
            out.push_str(buffer.format(query.page_lines));
            if query.page > 0 {
                out.push_str(" offset ");
                out.push_str(buffer.format(query.page * query.page_lines));
            }
        }
        if lock {
            self.write_select_lock(out);
        }
    }

    /// Row-locking suffix. Dialects without row locks override to nothing.
    fn write_select_lock(&self, out: &mut String) {
        out.push_str(" for update");
    }

    fn write_count(&self, out: &mut String, query: &Query, params: &Params) {
        out.push_str("select count(*) from ");
        out.push_str(&query.table);
        self.write_where(out, &query.conditions, params);
    }

    fn write_max(&self, out: &mut String, table: &str, column: &str) {
        out.push_str("select max(");
        out.push_str(column);
        out.push_str(") from ");
        out.push_str(table);
    }

    fn write_insert(&self, out: &mut String, table: &str, columns: &[&str]) {
        out.push_str("insert into ");
        out.push_str(table);
        out.push_str(" (");
        separated_by(out, columns.iter(), |out, v| out.push_str(v), ",");
        out.push_str(") values (");
        separated_by(
            out,
            columns.iter(),
            |out, v| {
                out.push(':');
                out.push_str(v);
            },
            ",",
        );
        out.push(')');
    }

    fn write_update(&self, out: &mut String, table: &str, columns: &[&str], key_column: &str) {
        out.push_str("update ");
        out.push_str(table);
        out.push_str(" set ");
        separated_by(
            out,
            columns.iter(),
            |out, v| {
                out.push_str(v);
                out.push_str(" = :");
                out.push_str(v);
            },
            ",",
        );
        out.push_str(" where ");
        out.push_str(key_column);
        out.push_str(" = :");
        out.push_str(key_column);
    }

    fn write_delete(&self, out: &mut String, table: &str, key_column: &str) {
        out.push_str("delete from ");
        out.push_str(table);
        out.push_str(" where ");
        out.push_str(key_column);
        out.push_str(" = :");
        out.push_str(key_column);
    }

    /// Appends ` where <condition>` unless the condition compiles to nothing.
    fn write_where(&self, out: &mut String, cond: &Cond, params: &Params) {
        let mut condition = String::new();
        self.write_condition(&mut condition, cond, params);
        if !condition.is_empty() {
            out.push_str(" where ");
            out.push_str(&condition);
        }
    }

    fn write_condition(&self, out: &mut String, cond: &Cond, params: &Params) {
        match cond {
            Cond::Group(items) => self.write_condition_list(out, items, params),
            other => self.write_condition_list(out, std::slice::from_ref(other), params),
        }
    }

    /// Walks one group. An AND/OR marker is recorded as the joiner for the
    /// next member and is ignored while nothing has been emitted yet, so a
    /// group's first member is never preceded by its own joiner. A leaf whose
    /// placeholder parameter is missing from `params` is omitted; a group
    /// that compiles to nothing is dropped entirely.
    fn write_condition_list(&self, out: &mut String, items: &[Cond], params: &Params) {
        let start = out.len();
        let mut pending = Op::Nop;
        for item in items {
            match item {
                Cond::And | Cond::Or => {
                    if out.len() > start {
                        pending = if matches!(item, Cond::And) { Op::And } else { Op::Or };
                    }
                }
                Cond::Leaf(leaf) => {
                    let Some((operand1, operand2)) = self.resolve_leaf(leaf, params) else {
                        continue;
                    };
                    let joiner = joiner_for(out.len() > start, pending);
                    out.push_str(self.op_template(joiner));
                    out.push_str(&embed(
                        self.op_template(leaf.op),
                        &[&leaf.field, &operand1, &operand2],
                    ));
                    pending = Op::Nop;
                }
                Cond::Group(inner) => {
                    let mut nested = String::new();
                    self.write_condition_list(&mut nested, inner, params);
                    if !nested.is_empty() {
                        let joiner = joiner_for(out.len() > start, pending);
                        out.push_str(self.op_template(joiner));
                        out.push('(');
                        out.push_str(&nested);
                        out.push(')');
                        pending = Op::Nop;
                    }
                }
            }
        }
    }

    /// Resolves both operands of a leaf, or `None` when the leaf must be
    /// omitted: a required parameter is missing from the leaf itself, or a
    /// required placeholder has no value in `params`.
    fn resolve_leaf(&self, leaf: &CondLeaf, params: &Params) -> Option<(String, String)> {
        if leaf.op.has_param() && leaf.param1.is_none() {
            return None;
        }
        if leaf.op == Op::Between && leaf.param2.is_none() {
            return None;
        }
        let quoted = !leaf.op.is_pattern();
        let mut operands = [String::new(), String::new()];
        for (slot, param) in [&leaf.param1, &leaf.param2].into_iter().enumerate() {
            let Some(param) = param else { continue };
            let value = match placeholder_name(&leaf.field, param) {
                Some(name) if leaf.op.has_param() => params.get(name)?,
                _ => param,
            };
            self.write_condition_value(&mut operands[slot], value, quoted);
        }
        let [operand1, operand2] = operands;
        Some((operand1, operand2))
    }

    /// Renders one resolved operand: arrays as a comma-joined literal list,
    /// booleans as bare keywords, numbers unquoted, everything else through
    /// the quoting chokepoint.
    fn write_condition_value(&self, out: &mut String, value: &Value, quoted: bool) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(v) => out.push_str(["false", "true"][*v as usize]),
            Value::Int(v) => {
                let mut buffer = itoa::Buffer::new();
                out.push_str(buffer.format(*v));
            }
            Value::Float(v) => {
                let mut buffer = ryu::Buffer::new();
                out.push_str(buffer.format(*v));
            }
            Value::Text(v) => {
                if quoted {
                    self.write_value_text(out, v);
                } else {
                    write_escaped(out, v);
                }
            }
            Value::List(items) => separated_by(
                out,
                items.iter(),
                |out, v| self.write_condition_value(out, v, true),
                ",",
            ),
            Value::Datetime(..) => {
                if quoted {
                    self.write_value_text(out, &value.to_text());
                } else {
                    write_escaped(out, &value.to_text());
                }
            }
        }
    }

    /// The single literal-quoting chokepoint: embedded quotes are doubled.
    fn write_value_text(&self, out: &mut String, value: &str) {
        out.push('\'');
        write_escaped(out, value);
        out.push('\'');
    }
}

fn joiner_for(has_output: bool, pending: Op) -> Op {
    match (has_output, pending) {
        (false, _) => Op::Nop,
        (true, Op::Nop) => Op::And,
        (true, pending) => pending,
    }
}

/// A parameter is a placeholder when it is a string that textually starts
/// with the field's own name (reserved naming convention).
fn placeholder_name<'v>(field: &str, param: &'v Value) -> Option<&'v str> {
    param.as_text().filter(|v| v.starts_with(field))
}

fn write_escaped(out: &mut String, value: &str) {
    let mut position = 0;
    for (i, c) in value.char_indices() {
        if c == '\'' {
            out.push_str(&value[position..i]);
            out.push_str("''");
            position = i + 1;
        }
    }
    out.push_str(&value[position..]);
}

/// Dialect-neutral writer using every default template.
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for GenericSqlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
