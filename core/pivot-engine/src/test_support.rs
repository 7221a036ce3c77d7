//! FILENAME: core/pivot-engine/src/test_support.rs
//! Shared execution fixtures for the unit tests of this crate.

use execution::{
    AggregationType, AttributeDescriptor, AttributeForm, DataValue, DataView, DimensionHeader,
    DimensionSpec, ExecutionDefinition, ExecutionResponse, ExecutionResult,
    MeasureDescriptor, MeasureGroupDescriptor, Paging, ResultDimension, ResultHeader,
    TotalHeaderItem, TotalItem, MEASURE_GROUP,
};

pub(crate) fn create_test_attribute(local_id: &str, obj_id: u32, name: &str) -> AttributeDescriptor {
    AttributeDescriptor {
        local_identifier: local_id.to_string(),
        uri: format!("/gdc/md/project/obj/{}", obj_id),
        identifier: format!("label.{}", name.to_lowercase()),
        name: name.to_string(),
        form_of: AttributeForm {
            uri: format!("/gdc/md/project/obj/{}", obj_id + 1000),
            identifier: format!("attr.{}", name.to_lowercase()),
            name: name.to_string(),
        },
        total_items: Vec::new(),
    }
}

pub(crate) fn create_test_measure(local_id: &str, name: &str) -> MeasureDescriptor {
    MeasureDescriptor {
        local_identifier: local_id.to_string(),
        name: name.to_string(),
        uri: Some(format!("/gdc/md/project/obj/{}", local_id)),
        identifier: Some(format!("metric.{}", name.to_lowercase())),
        format: "#,##0".to_string(),
    }
}

pub(crate) fn create_test_item(obj_id: u32, value_id: u32, name: &str) -> ResultHeader {
    ResultHeader::attribute(
        format!("/gdc/md/project/obj/{}/elements?id={}", obj_id, value_id),
        name,
    )
}

pub(crate) fn values(row: &[&str]) -> Vec<DataValue> {
    row.iter().map(|value| Some(value.to_string())).collect()
}

fn paging(rows: usize, columns: usize) -> Paging {
    Paging {
        count: vec![rows, columns],
        offset: vec![0, 0],
        total: vec![rows, columns],
    }
}

/// Rows `P`, `R`; measures `Lost`, `Won`, `Expected` in the column dimension.
pub(crate) fn create_test_sales_view() -> DataView {
    let definition = ExecutionDefinition::new(vec![
        DimensionSpec::new(vec!["a1".to_string(), "a2".to_string()]),
        DimensionSpec::new(vec![MEASURE_GROUP.to_string()]),
    ]);
    let response = ExecutionResponse {
        dimensions: vec![
            ResultDimension::new(vec![
                DimensionHeader::Attribute(create_test_attribute("a1", 1, "P")),
                DimensionHeader::Attribute(create_test_attribute("a2", 2, "R")),
            ]),
            ResultDimension::new(vec![DimensionHeader::MeasureGroup(MeasureGroupDescriptor {
                items: vec![
                    create_test_measure("m1", "Lost"),
                    create_test_measure("m2", "Won"),
                    create_test_measure("m3", "Expected"),
                ],
            })]),
        ],
    };
    let result = ExecutionResult {
        data: vec![
            values(&["1", "2", "3"]),
            values(&["4", "5", "6"]),
            values(&["7", "8", "9"]),
        ],
        header_items: vec![
            vec![
                vec![
                    create_test_item(1, 1, "P1"),
                    create_test_item(1, 1, "P1"),
                    create_test_item(1, 2, "P2"),
                ],
                vec![
                    create_test_item(2, 1, "R1"),
                    create_test_item(2, 2, "R2"),
                    create_test_item(2, 1, "R1"),
                ],
            ],
            vec![vec![
                ResultHeader::measure("Lost", 0),
                ResultHeader::measure("Won", 1),
                ResultHeader::measure("Expected", 2),
            ]],
        ],
        totals: None,
        paging: paging(3, 3),
    };
    DataView::new(definition, response, result)
}

/// The sales view with a grand total `sum` on `Lost`.
pub(crate) fn create_test_sales_view_with_grand_total() -> DataView {
    let mut view = create_test_sales_view();
    let totals = vec![TotalItem::new(AggregationType::Sum, "m1", "a1")];
    view.definition = view.definition.with_row_totals(totals);
    if let Some(DimensionHeader::Attribute(p)) = view.response.dimensions[0].headers.get_mut(0) {
        p.total_items = vec![TotalHeaderItem {
            total_type: AggregationType::Sum,
            name: "sum".to_string(),
        }];
    }
    view.result.totals = Some(vec![vec![vec![Some("12".to_string()), None, None]], Vec::new()]);
    view
}

/// The sales view with a `sum` subtotal on `R` after each `P` value.
pub(crate) fn create_test_sales_view_with_subtotals() -> DataView {
    let mut view = create_test_sales_view();
    let totals = vec![
        TotalItem::new(AggregationType::Sum, "m1", "a2"),
        TotalItem::new(AggregationType::Sum, "m2", "a2"),
    ];
    view.definition = view.definition.with_row_totals(totals);
    if let Some(DimensionHeader::Attribute(r)) = view.response.dimensions[0].headers.get_mut(1) {
        r.total_items = vec![TotalHeaderItem {
            total_type: AggregationType::Sum,
            name: "sum".to_string(),
        }];
    }
    let subtotal = ResultHeader::total(AggregationType::Sum, "sum");
    view.result.header_items[0] = vec![
        vec![
            create_test_item(1, 1, "P1"),
            create_test_item(1, 1, "P1"),
            create_test_item(1, 1, "P1"),
            create_test_item(1, 2, "P2"),
            create_test_item(1, 2, "P2"),
        ],
        vec![
            create_test_item(2, 1, "R1"),
            create_test_item(2, 2, "R2"),
            subtotal.clone(),
            create_test_item(2, 1, "R1"),
            subtotal,
        ],
    ];
    view.result.data = vec![
        values(&["1", "2", "3"]),
        values(&["4", "5", "6"]),
        values(&["5", "7", ""]),
        values(&["7", "8", "9"]),
        values(&["7", "8", ""]),
    ];
    view.result.paging = paging(5, 3);
    view
}

/// One row attribute `Region`; column attributes `Quarter` (A, B) and
/// `Year` (Y); measures `Costs`, `Revenues`.
pub(crate) fn create_test_column_view() -> DataView {
    let definition = ExecutionDefinition::new(vec![
        DimensionSpec::new(vec!["a1".to_string()]),
        DimensionSpec::new(vec!["a2".to_string(), "a3".to_string(), MEASURE_GROUP.to_string()]),
    ]);
    let response = ExecutionResponse {
        dimensions: vec![
            ResultDimension::new(vec![DimensionHeader::Attribute(create_test_attribute(
                "a1", 1, "Region",
            ))]),
            ResultDimension::new(vec![
                DimensionHeader::Attribute(create_test_attribute("a2", 2, "Quarter")),
                DimensionHeader::Attribute(create_test_attribute("a3", 3, "Year")),
                DimensionHeader::MeasureGroup(MeasureGroupDescriptor {
                    items: vec![
                        create_test_measure("m1", "Costs"),
                        create_test_measure("m2", "Revenues"),
                    ],
                }),
            ]),
        ],
    };
    let result = ExecutionResult {
        data: vec![
            values(&["10", "20", "30", "40"]),
            values(&["50", "60", "70", "80"]),
        ],
        header_items: vec![
            vec![vec![create_test_item(1, 1, "West"), create_test_item(1, 2, "East")]],
            vec![
                vec![
                    create_test_item(2, 1, "A"),
                    create_test_item(2, 1, "A"),
                    create_test_item(2, 2, "B"),
                    create_test_item(2, 2, "B"),
                ],
                vec![
                    create_test_item(3, 7, "Y"),
                    create_test_item(3, 7, "Y"),
                    create_test_item(3, 7, "Y"),
                    create_test_item(3, 7, "Y"),
                ],
                vec![
                    ResultHeader::measure("Costs", 0),
                    ResultHeader::measure("Revenues", 1),
                    ResultHeader::measure("Costs", 0),
                    ResultHeader::measure("Revenues", 1),
                ],
            ],
        ],
        totals: None,
        paging: paging(2, 4),
    };
    DataView::new(definition, response, result)
}

/// No row attributes, measures `Lost` and `Won`.
pub(crate) fn create_test_measures_only_view() -> DataView {
    let definition = ExecutionDefinition::new(vec![
        DimensionSpec::new(Vec::new()),
        DimensionSpec::new(vec![MEASURE_GROUP.to_string()]),
    ]);
    let response = ExecutionResponse {
        dimensions: vec![
            ResultDimension::new(Vec::new()),
            ResultDimension::new(vec![DimensionHeader::MeasureGroup(MeasureGroupDescriptor {
                items: vec![create_test_measure("m1", "Lost"), create_test_measure("m2", "Won")],
            })]),
        ],
    };
    let result = ExecutionResult {
        data: vec![values(&["100", "200"])],
        header_items: vec![
            Vec::new(),
            vec![vec![ResultHeader::measure("Lost", 0), ResultHeader::measure("Won", 1)]],
        ],
        totals: None,
        paging: paging(1, 2),
    };
    DataView::new(definition, response, result)
}

/// Row attributes only, no measures.
pub(crate) fn create_test_attributes_only_view() -> DataView {
    let definition = ExecutionDefinition::new(vec![
        DimensionSpec::new(vec!["a1".to_string()]),
        DimensionSpec::new(Vec::new()),
    ]);
    let response = ExecutionResponse {
        dimensions: vec![
            ResultDimension::new(vec![DimensionHeader::Attribute(create_test_attribute(
                "a1", 1, "Region",
            ))]),
            ResultDimension::new(Vec::new()),
        ],
    };
    let result = ExecutionResult {
        data: Vec::new(),
        header_items: vec![
            vec![vec![
                create_test_item(1, 1, "West"),
                create_test_item(1, 2, "East"),
                create_test_item(1, 3, "North"),
            ]],
            Vec::new(),
        ],
        totals: None,
        paging: paging(3, 0),
    };
    DataView::new(definition, response, result)
}
