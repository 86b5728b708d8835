// src/reports/params.rs
//
// Query fields for each report form, as the portal's own UI submits them.

use chrono::NaiveDate;

use super::dates::{format_portal_date, week_start, Period};
use crate::fetch::QueryParams;

const COMFORT_KEEPER_COLUMNS: &[&str] = &[
    "rFirst",
    "rLast",
    "rAddr1,rAddr2,rCity,rState,rZip",
    "rPhone",
    "rFax",
    "rMobile",
    "rGender",
    "hireDate",
    "rDOB",
    "rEmail",
];

fn push(params: &mut QueryParams, name: &str, value: impl Into<String>) {
    params.push((name.to_string(), value.into()));
}

fn push_all(params: &mut QueryParams, fields: &[(&str, &str)]) {
    for &(name, value) in fields {
        push(params, name, value);
    }
}

/// Active caregiver roster.
pub fn comfort_keepers(today: NaiveDate) -> QueryParams {
    let date = format_portal_date(today);
    let mut params = QueryParams::new();

    push_all(
        &mut params,
        &[
            ("event", "admin.reports.resource.resourceData.viewResourceData"),
            ("statusFlag", "A"),
        ],
    );
    for column in COMFORT_KEEPER_COLUMNS {
        push(&mut params, "colNames", *column);
    }
    push_all(
        &mut params,
        &[
            ("administratorID", ""),
            ("administratorID_aNameDisplay", "-- All Administrators --"),
            ("adminShow", "0"),
            ("classID", ""),
            ("classID_classNameDisplay", "-- Select Class --"),
            ("tagSelect_select", ""),
            ("tagSelect", ""),
            ("tagOption", "ANY"),
            ("sortBy", "last"),
            ("excel", "N"),
            ("dateFilterOption", "OR"),
            ("dateFilterBy", "rDOB"),
        ],
    );
    push(&mut params, "dateFilterBy_from", date.clone());
    push(&mut params, "__dateFilterBy_from_hidden", date.clone());
    push(&mut params, "dateFilterBy_to", date.clone());
    push(&mut params, "__dateFilterBy_to_hidden", date);
    push(&mut params, "resourceDataSubmit", "Run Report");
    push(&mut params, "resourceDataSubmit", "Run Report");
    params
}

/// Per-caregiver activity for today, one table per caregiver.
pub fn activity(today: NaiveDate) -> QueryParams {
    let date = format_portal_date(today);
    let monday = format_portal_date(week_start(today));
    let period = Period::of(today);
    let mut params = QueryParams::new();

    push_all(
        &mut params,
        &[
            ("event", "admin.reports.hours.activity.viewActivity"),
            ("comments", "N"),
            ("reportType", "LS"),
            ("summaryByCustomer", "No"),
            ("SummaryPageBreaks", "No"),
            ("ListSort", "resource"),
            ("resourceID_inputmultiselect", "Select Comfort Keeper(s)"),
            ("resourceID_rNameDisplay", ""),
            ("resShow", "0"),
            ("customerID_inputmultiselect", "Select Customer(s)"),
            ("customerID_cNameDisplay", ""),
            ("custShow", "0"),
            ("administrator_inputmultiselect", "Select Administrator(s)"),
            ("administrator_aNameDisplay", ""),
            ("adminShow", "0"),
            ("adminType", "C"),
            ("customerClassIDs_inputmultiselect", "Select Classes"),
            ("customerClassIDs_classNameDisplay", ""),
            ("filterAssign_AE_mins", "5"),
            ("filterAssign_AL_mins", "5"),
            ("filterAssign_DE_mins", "5"),
            ("filterAssign_DL_mins", "5"),
            ("ListType", "D"),
            ("showTravelTime", "0"),
            ("showExpenses", "N"),
            ("showComments", "N"),
            ("showPayName", "N"),
            ("showPayItem", "N"),
            ("showTelephony", "N"),
            ("showActions", "N"),
            ("pagebreaks", "N"),
            ("selectType", "0"),
            ("outputType", "W"),
        ],
    );
    push(&mut params, "date", date.clone());
    push(&mut params, "__date_hidden", date.clone());
    push(&mut params, "toDate", date.clone());
    push(&mut params, "__toDate_hidden", date);
    push(&mut params, "__maxRange", "365");
    push(&mut params, "searchWeek", monday);
    push(&mut params, "Periodicity", "M");
    push(&mut params, "searchMonth", period.month.to_string());
    push(&mut params, "MYear", period.year.to_string());
    push(&mut params, "searchQuarter", period.quarter.to_string());
    push(&mut params, "QYear", period.year.to_string());
    push(&mut params, "searchYear", period.year.to_string());
    params
}

/// Telephony call and clock-in log for today.
pub fn calls_clocks_log(today: NaiveDate) -> QueryParams {
    let date = format_portal_date(today);
    let monday = format_portal_date(week_start(today));
    let mut params = QueryParams::new();

    push_all(
        &mut params,
        &[
            ("event", "admin.reports.telephony.callLog.runCallLog"),
            ("resourceID_inputmultiselect", "Select Comfort Keeper(s)"),
            ("resourceID_rNameDisplay", ""),
            ("resShow", "0"),
            ("customerID_inputmultiselect", "Select Customer(s)"),
            ("customerID_cNameDisplay", ""),
            ("custShow", "0"),
            ("filterBy", "0"),
            ("clockType", "0"),
        ],
    );
    push(&mut params, "date", date.clone());
    push(&mut params, "__date_hidden", date.clone());
    push(&mut params, "toDate", date.clone());
    push(&mut params, "__toDate_hidden", date);
    push(&mut params, "__maxRange", "0");
    push(&mut params, "Periodicity", "W");
    push(&mut params, "searchWeek", monday);
    params
}
