//! Sensor log filtering, pickers and dashboard aggregates.
//!
//! Run with: cargo test --test log_filter_test

mod common;

use common::{Reading, add_building, dispatcher, insert_reading, setup_db};
use greenbuilding::error::AppError;
use greenbuilding::query::{self, LogFilter, LogFilterForm};

fn form(fields: &[(&str, &str)]) -> LogFilterForm {
    let mut form = LogFilterForm::default();
    for (name, value) in fields {
        let value = Some((*value).to_string());
        match *name {
            "building" => form.building = value,
            "floor" => form.floor = value,
            "room" => form.room = value,
            "start_date" => form.start_date = value,
            "end_date" => form.end_date = value,
            other => panic!("unknown filter field {other}"),
        }
    }
    form
}

fn filter(fields: &[(&str, &str)]) -> LogFilter {
    LogFilter::try_from(form(fields)).expect("filter should parse")
}

#[tokio::test]
async fn date_bounds_are_exclusive() {
    let db = setup_db().await;
    for date in ["2020-01-01", "2020-01-15", "2020-02-01"] {
        insert_reading(
            &db,
            Reading {
                date,
                ..Default::default()
            },
        )
        .await;
    }

    let entries = query::filter_log(
        &db,
        &filter(&[("start_date", "2020-01-01"), ("end_date", "2020-02-01")]),
    )
    .await
    .unwrap();

    let dates: Vec<&str> = entries.iter().map(|e| e.date.as_str()).collect();
    assert_eq!(dates, vec!["2020-01-15"]);
}

#[tokio::test]
async fn constraints_are_anded() {
    let db = setup_db().await;
    for (building_id, floor, room) in [(1, 2, "201"), (1, 2, "202"), (1, 3, "201"), (2, 2, "201")] {
        insert_reading(
            &db,
            Reading {
                building_id,
                floor,
                room,
                ..Default::default()
            },
        )
        .await;
    }

    let entries = query::filter_log(
        &db,
        &filter(&[("building", "1"), ("floor", "2"), ("room", "201")]),
    )
    .await
    .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(
        (entries[0].building_id, entries[0].floor, entries[0].room.as_str()),
        (1, 2, "201")
    );
}

#[tokio::test]
async fn blank_fields_impose_no_constraint() {
    let db = setup_db().await;
    for building_id in [1, 2] {
        insert_reading(
            &db,
            Reading {
                building_id,
                ..Default::default()
            },
        )
        .await;
    }

    let parsed = filter(&[
        ("building", ""),
        ("floor", "  "),
        ("room", ""),
        ("start_date", ""),
        ("end_date", ""),
    ]);
    assert_eq!(parsed, LogFilter::default());

    let entries = query::filter_log(&db, &parsed).await.unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn results_are_ordered_and_formatted() {
    let db = setup_db().await;
    for (date, time) in [
        ("2020-03-02", "07:30"),
        ("2020-03-01", "18:05"),
        ("2020-03-01", "09:45"),
    ] {
        insert_reading(
            &db,
            Reading {
                date,
                time,
                ..Default::default()
            },
        )
        .await;
    }

    let entries = query::filter_log(&db, &LogFilter::default()).await.unwrap();

    let stamps: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e.date.as_str(), e.time.as_str()))
        .collect();
    assert_eq!(
        stamps,
        vec![
            ("2020-03-01", "09:45"),
            ("2020-03-01", "18:05"),
            ("2020-03-02", "07:30"),
        ]
    );
}

#[test]
fn unparseable_values_are_invalid() {
    let err = LogFilter::try_from(form(&[("start_date", "01/15/2020")])).unwrap_err();
    assert!(matches!(err, AppError::InvalidField { field: "start_date", .. }));

    let err = LogFilter::try_from(form(&[("building", "north")])).unwrap_err();
    assert!(matches!(err, AppError::InvalidField { field: "building", .. }));
}

#[tokio::test]
async fn empty_log_yields_empty_results() {
    let db = setup_db().await;

    let entries = query::filter_log(&db, &filter(&[("building", "1")])).await.unwrap();
    let indexes = query::log_indexes(&db).await.unwrap();

    assert!(entries.is_empty());
    assert!(indexes.buildings.is_empty() && indexes.floors.is_empty() && indexes.rooms.is_empty());
}

#[tokio::test]
async fn indexes_are_distinct_and_numerically_sorted() {
    let db = setup_db().await;
    for (building_id, floor, room) in [
        (10, 2, "10"),
        (2, 10, "2"),
        (1, 2, "lab"),
        (2, 1, "10"),
        (10, 0, "100"),
    ] {
        insert_reading(
            &db,
            Reading {
                building_id,
                floor,
                room,
                ..Default::default()
            },
        )
        .await;
    }

    let indexes = query::log_indexes(&db).await.unwrap();

    assert_eq!(indexes.buildings, vec![1, 2, 10]);
    assert_eq!(indexes.floors, vec![0, 1, 2, 10]);
    assert_eq!(indexes.rooms, vec!["2", "10", "100", "lab"]);
}

#[tokio::test]
async fn summary_counts_reporting_nodes() {
    let db = setup_db().await;
    let d = dispatcher(&db);
    add_building(&d, &db, "HQ").await;

    // Sensor 1 first reports ON, sensor 2 first reports OFF
    for (sensor_id, cluster_id, building_id, status) in [
        (1, 1, 1, "ON"),
        (2, 1, 1, "OFF"),
        (2, 1, 1, "ON"),
        (3, 2, 2, "ON"),
    ] {
        insert_reading(
            &db,
            Reading {
                sensor_id,
                cluster_id,
                building_id,
                status,
                ..Default::default()
            },
        )
        .await;
    }

    let summary = query::dashboard_summary(&db).await.unwrap();

    assert_eq!(summary.sensors_reporting, 3);
    assert_eq!(summary.sensors_active, 2);
    assert_eq!(summary.clusters_reporting, 2);
    assert_eq!(summary.buildings_reporting, 2);
    assert_eq!(summary.buildings.len(), 1);
    assert_eq!(summary.buildings[0].name, "HQ");
}
