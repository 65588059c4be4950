//! Spreadsheet downloads

use super::{ApiState, require_admin};
use crate::core::auth::AuthContext;
use crate::core::error::RentalResult;
use crate::core::query::by_creation;
use crate::core::service::with_deadline;
use crate::reports::{ITEM_COLUMNS, RENTAL_COLUMNS, Report, ReportFile, XLSX_CONTENT_TYPE};
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

impl IntoResponse for ReportFile {
    fn into_response(self) -> Response {
        let disposition = self.disposition();
        (
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.data,
        )
            .into_response()
    }
}

/// POST /reports/items.xlsx
pub async fn items(State(state): State<ApiState>, actor: AuthContext) -> RentalResult<ReportFile> {
    require_admin(&actor)?;

    let mut items = with_deadline(state.timeout(), state.stores.items.list()).await?;
    items.sort_by(by_creation);

    let report = Report::from_entities(&state.config.reports.items_sheet, ITEM_COLUMNS, &items);
    let file = ReportFile::render("items.xlsx", &report)?;
    tracing::info!(rows = file.row_count, "items report generated");
    Ok(file)
}

/// POST /reports/rentals.xlsx
pub async fn rentals(
    State(state): State<ApiState>,
    actor: AuthContext,
) -> RentalResult<ReportFile> {
    require_admin(&actor)?;

    let mut rentals = with_deadline(state.timeout(), state.stores.rentals.list()).await?;
    rentals.sort_by(by_creation);

    let report = Report::from_entities(
        &state.config.reports.rentals_sheet,
        RENTAL_COLUMNS,
        &rentals,
    );
    let file = ReportFile::render("rentals.xlsx", &report)?;
    tracing::info!(rows = file.row_count, "rentals report generated");
    Ok(file)
}
