//! Layer schemas and raw-layer table DDL.
//!
//! Bronze tables mirror the source extracts column for column; the loader
//! relies on the declared column order and lets `DuckDB` cast each text field
//! to the declared type.

use strata_core::Layer;

/// Bronze table definitions, keyed by table name. Every manifest entry has
/// exactly one definition here.
pub const BRONZE_TABLES: [(&str, &str); 6] = [
    (
        "crm_cust_info",
        "cst_id INTEGER,
        cst_key VARCHAR,
        cst_firstname VARCHAR,
        cst_lastname VARCHAR,
        cst_marital_status VARCHAR,
        cst_gndr VARCHAR,
        cst_create_date DATE",
    ),
    (
        "crm_prd_info",
        "prd_id INTEGER,
        prd_key VARCHAR,
        prd_nm VARCHAR,
        prd_cost INTEGER,
        prd_line VARCHAR,
        prd_start_dt TIMESTAMP,
        prd_end_dt TIMESTAMP",
    ),
    (
        "crm_sales_details",
        "sls_ord_num VARCHAR,
        sls_prd_key VARCHAR,
        sls_cust_id INTEGER,
        sls_order_dt INTEGER,
        sls_ship_dt INTEGER,
        sls_due_dt INTEGER,
        sls_sales INTEGER,
        sls_quantity INTEGER,
        sls_price INTEGER",
    ),
    ("erp_loc_a101", "cid VARCHAR, cntry VARCHAR"),
    ("erp_cust_az12", "cid VARCHAR, bdate DATE, gen VARCHAR"),
    (
        "erp_px_cat_g1v2",
        "id VARCHAR, cat VARCHAR, subcat VARCHAR, maintenance VARCHAR",
    ),
];

/// Quote an identifier for interpolation into SQL.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `"schema"."table"`.
#[must_use]
pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// DDL creating the three layer schemas and every bronze table.
#[must_use]
pub fn bootstrap_ddl() -> String {
    use std::fmt::Write;
    let mut ddl = String::new();
    for layer in Layer::ALL {
        let _ = writeln!(
            ddl,
            "CREATE SCHEMA IF NOT EXISTS {};",
            quote_ident(layer.as_str())
        );
    }
    for (table, columns) in BRONZE_TABLES {
        let _ = writeln!(
            ddl,
            "CREATE TABLE IF NOT EXISTS {} ({columns});",
            qualified(Layer::Bronze.as_str(), table)
        );
    }
    ddl
}
