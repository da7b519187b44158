//! SQL identifiers derived from schema names.

/// Name of the synthetic primary key of every table.
pub const ID_COLUMN: &str = "id";

/// Column that receives the character content of simple content types and repeated simple
/// elements.
pub const VALUE_COLUMN: &str = "value";

/// Turns an XML name into an SQL identifier. XML names may contain `-` and `.`, which are
/// replaced by `_`.
pub fn sql_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// The foreign key column a child table gets for its parent.
pub fn parent_key_column(parent_table: &str) -> String {
    format!("{}_id", parent_table.to_lowercase())
}

pub fn foreign_key_name(child_table: &str, column: &str) -> String {
    format!("fk_{child_table}_{column}")
}

/// SQL identifiers compare case-insensitively.
pub fn same_identifier(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Picks a table name that `is_taken` does not report: `name`, then `name_parent`, then
/// `name_parent_2`, `name_parent_3`, …
pub fn disambiguate_table(
    name: &str,
    parent_table: Option<&str>,
    is_taken: impl Fn(&str) -> bool,
) -> String {
    if !is_taken(name) {
        return name.to_string();
    }
    let candidate = match parent_table {
        Some(parent) => format!("{name}_{parent}"),
        None => format!("{name}_root"),
    };
    if !is_taken(&candidate) {
        return candidate;
    }
    let mut n = 2;
    loop {
        let numbered = format!("{candidate}_{n}");
        if !is_taken(&numbered) {
            return numbered;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert_eq!(sql_identifier("cMun-FG.x"), "cMun_FG_x");
        assert_eq!(parent_key_column("Order"), "order_id");
        assert_eq!(foreign_key_name("Item", "order_id"), "fk_Item_order_id");
        assert!(same_identifier("CNPJ", "cnpj"));
    }

    #[test]
    fn table_names_are_disambiguated() {
        let taken = ["det", "det_NFe", "det_NFe_2"];
        let is_taken = |n: &str| taken.iter().any(|t| same_identifier(t, n));

        assert_eq!(disambiguate_table("prod", Some("det"), is_taken), "prod");
        assert_eq!(disambiguate_table("det", Some("NFe"), is_taken), "det_NFe_3");
        assert_eq!(disambiguate_table("DET", Some("infNFe"), is_taken), "DET_infNFe");
        assert_eq!(disambiguate_table("det", None, is_taken), "det_root");
    }
}
