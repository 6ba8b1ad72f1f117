// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `authoring schema`: print the edge rule table.

use std::io::Write;

use anyhow::Result;
use authoring_graph::{AssetTypeId, EdgeRuleSchema, TypeRules};
use serde_json::{json, Map, Value};

use crate::cli::Format;
use crate::output;

fn entry_json(rules: &TypeRules) -> Value {
    let groups: Map<String, Value> = rules
        .groups
        .iter()
        .map(|g| {
            let targets: Vec<&str> = g.targets.iter().map(|t| t.as_str()).collect();
            (g.group.as_str().to_string(), json!(targets))
        })
        .collect();
    json!({ "source": rules.source.as_str(), "groups": groups })
}

pub fn run(
    out: &mut impl Write,
    format: Format,
    type_id: Option<AssetTypeId>,
    groups_only: bool,
) -> Result<()> {
    let schema = EdgeRuleSchema::standard();

    if groups_only {
        let names: Vec<&str> = schema
            .all_group_names()
            .into_iter()
            .map(|g| g.as_str())
            .collect();
        if format == Format::Json {
            return output::json(out, &names);
        }
        for name in names {
            writeln!(out, "{name}")?;
        }
        return Ok(());
    }

    let entries: Vec<&TypeRules> = schema
        .entries()
        .iter()
        .filter(|r| type_id.is_none_or(|t| r.source == t))
        .collect();

    if format == Format::Json {
        let values: Vec<Value> = entries.iter().map(|r| entry_json(r)).collect();
        return output::json(out, &values);
    }

    if let (Some(type_id), true) = (type_id, entries.is_empty()) {
        writeln!(out, "{type_id} declares no edge groups")?;
        return Ok(());
    }

    let mut table = output::table(["Source", "Group", "Targets"]);
    for rules in entries {
        for group in rules.groups {
            let targets: Vec<&str> = group.targets.iter().map(|t| t.as_str()).collect();
            table.add_row(vec![
                rules.source.as_str().to_string(),
                group.group.as_str().to_string(),
                targets.join(", "),
            ]);
        }
    }
    writeln!(out, "{table}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn json_entry_lists_targets_per_group() {
        let mut buf = Vec::new();
        run(&mut buf, Format::Json, Some(AssetTypeId::Unit), false).unwrap();
        let value: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            value,
            json!([{ "source": "unit.1", "groups": { "elements": ["module.1"] } }])
        );
    }

    #[test]
    fn leaf_types_say_so() {
        let mut buf = Vec::new();
        run(&mut buf, Format::Text, Some(AssetTypeId::Competency), false).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "competency.1 declares no edge groups\n"
        );
    }
}
