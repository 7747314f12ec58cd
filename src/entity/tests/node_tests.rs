//! Unit tests for ride result trees.

use crate::entity::{Company, CompanyNode, Line, LineNode, Ride, RideNode, Station};
use rstest::{fixture, rstest};
use serde_json::json;

fn station(identifier: &str, name: &str) -> Station {
    Station::new(identifier, name).expect("station should be valid")
}

fn ride(identifier: &str, name: &str, stations: Vec<Station>) -> RideNode {
    RideNode::new(
        Ride::new(identifier, name).expect("ride should be valid"),
        stations,
    )
}

#[fixture]
fn unsorted_company() -> CompanyNode {
    let line_b = LineNode::new(
        Line::new("l-b", "B").expect("line should be valid"),
        vec![
            ride("r2", "09:10", vec![station("s2", "Zoo"), station("s1", "Airport")]),
            ride("r1", "08:55", vec![station("s3", "Market")]),
        ],
    );
    let line_a = LineNode::new(
        Line::new("l-a", "A").expect("line should be valid"),
        vec![ride("r3", "07:00", vec![station("s4", "Harbour")])],
    );
    CompanyNode::new(
        Company::new("c1", "City Transit").expect("company should be valid"),
        vec![line_b, line_a],
    )
}

#[rstest]
fn sorted_orders_every_level_by_name(unsorted_company: CompanyNode) {
    let sorted = unsorted_company.sorted();

    let lines: Vec<&str> = sorted.lines().iter().map(|node| node.line().name()).collect();
    assert_eq!(lines, vec!["A", "B"]);

    let line_b = sorted.lines().get(1).expect("line B should exist");
    let rides: Vec<&str> = line_b.rides().iter().map(|node| node.ride().name()).collect();
    assert_eq!(rides, vec!["08:55", "09:10"]);

    let late_ride = line_b.rides().get(1).expect("second ride should exist");
    let stations: Vec<&str> = late_ride.stations().iter().map(Station::name).collect();
    assert_eq!(stations, vec!["Airport", "Zoo"]);
}

#[rstest]
fn sorting_twice_is_idempotent(unsorted_company: CompanyNode) {
    let once = unsorted_company.sorted();
    let twice = once.clone().sorted();
    assert_eq!(
        serde_json::to_value(&once).expect("serialization should succeed"),
        serde_json::to_value(&twice).expect("serialization should succeed")
    );
}

#[rstest]
fn nodes_serialize_as_head_and_children() {
    let node = ride("r1", "08:55", vec![station("s1", "Market")]);

    let value = serde_json::to_value(&node).expect("serialization should succeed");

    assert_eq!(
        value,
        json!([["r1", {}, "08:55", {}], [["s1", {}, "Market", {}]]])
    );
}

#[rstest]
fn company_tree_decodes_from_nested_tuples() {
    let decoded: CompanyNode = serde_json::from_value(json!([
        ["c1", {}, "City Transit", {}],
        [[["l1", {}, "1", {}], [[["r1", {}, "08:00", {}], [["s1", {}, "Market", {}]]]]]]
    ]))
    .expect("decoding should succeed");

    assert_eq!(decoded.company().name(), "City Transit");
    let line = decoded.lines().first().expect("one line expected");
    assert_eq!(line.rides().len(), 1);
}

#[rstest]
fn null_nodes_are_detected() {
    assert!(RideNode::default().is_null());
    assert!(LineNode::default().is_null());
    assert!(CompanyNode::default().is_null());
    assert!(!ride("r1", "08:55", Vec::new()).is_null());
}
