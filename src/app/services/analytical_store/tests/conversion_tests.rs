//! Tests for entity to columnar conversion

use super::*;
use crate::app::services::analytical_store::conversion::{
    contracts_from_dataframe, contracts_to_dataframe, facilities_from_dataframe,
    facilities_to_dataframe, ids_from_dataframe, products_from_dataframe, products_to_dataframe,
    readings_from_dataframe, readings_to_dataframe,
};

#[test]
fn test_contract_round_trip_keeps_open_ended_contracts() {
    let contracts = vec![
        contract("C-A", "F1", ts(2024, 1, 1), Some(ts(2024, 6, 1))),
        contract("C-B", "F1", ts(2024, 6, 1), None),
    ];

    let df = contracts_to_dataframe(&contracts).unwrap();
    assert_eq!(df.height(), 2);

    let loaded = contracts_from_dataframe(&df).unwrap();
    assert_eq!(loaded, contracts);
    assert!(loaded[1].is_open_ended());
}

#[test]
fn test_reading_round_trip() {
    let readings = vec![
        reading("F1", ts(2024, 3, 15), 125.5),
        reading("F2", ts(2024, 3, 16), 0.0),
    ];

    let df = readings_to_dataframe(&readings).unwrap();
    let loaded = readings_from_dataframe(&df).unwrap();
    assert_eq!(loaded, readings);
}

#[test]
fn test_product_and_facility_round_trips() {
    let products = vec![product("P1"), product("P2")];
    let loaded = products_from_dataframe(&products_to_dataframe(&products).unwrap()).unwrap();
    assert_eq!(loaded, products);

    let facilities = vec![facility("F1")];
    let loaded =
        facilities_from_dataframe(&facilities_to_dataframe(&facilities).unwrap()).unwrap();
    assert_eq!(loaded, facilities);
}

#[test]
fn test_ids_from_dataframe() {
    let df = products_to_dataframe(&[product("P1"), product("P2")]).unwrap();
    let ids = ids_from_dataframe(&df, "product_id").unwrap();

    assert_eq!(ids.len(), 2);
    assert!(ids.contains("P1"));
    assert!(ids.contains("P2"));
}
