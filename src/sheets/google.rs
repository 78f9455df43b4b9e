use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{SheetError, SheetStore, ValueRange};

const API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Google Sheets v4 client bound to one spreadsheet.
pub struct GoogleSheet {
    spreadsheet_id: String,
    access_token: String,
    client: reqwest::Client,
}

impl GoogleSheet {
    pub fn new(spreadsheet_id: String, access_token: String) -> Self {
        Self {
            spreadsheet_id,
            access_token,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{API_BASE}/{}{suffix}", self.spreadsheet_id)
    }

    async fn send(&self, operation: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let resp = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .with_context(|| format!("Sheets API request failed: {operation}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SheetError::Api {
                operation: operation.to_string(),
                status,
                body,
            }
            .into());
        }
        Ok(resp)
    }
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[async_trait]
impl SheetStore for GoogleSheet {
    async fn get_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        debug!(range, "reading values");
        let url = self.url(&format!("/values/{}", urlencoding::encode(range)));
        let resp = self.send("values.get", self.client.get(&url)).await?;
        let data: ValuesResponse = resp
            .json()
            .await
            .with_context(|| format!("Failed to parse values of {range}"))?;
        Ok(data.values)
    }

    async fn append_rows(&self, sheet: &str, rows: Vec<Vec<Option<String>>>) -> Result<()> {
        debug!(sheet, rows = rows.len(), "appending rows");
        let range = format!("{sheet}!A1");
        let url = self.url(&format!(
            "/values/{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            urlencoding::encode(&range)
        ));
        let body = serde_json::json!({ "values": rows });
        self.send("values.append", self.client.post(&url).json(&body))
            .await?;
        Ok(())
    }

    async fn batch_update_values(&self, data: Vec<ValueRange>) -> Result<()> {
        debug!(ranges = data.len(), "batch updating values");
        let body = serde_json::json!({
            "valueInputOption": "USER_ENTERED",
            "data": data,
        });
        self.send(
            "values.batchUpdate",
            self.client.post(self.url("/values:batchUpdate")).json(&body),
        )
        .await?;
        Ok(())
    }

    async fn batch_update(&self, requests: Vec<serde_json::Value>) -> Result<()> {
        debug!(requests = requests.len(), "batch updating spreadsheet");
        let body = serde_json::json!({ "requests": requests });
        self.send(
            "batchUpdate",
            self.client.post(self.url(":batchUpdate")).json(&body),
        )
        .await?;
        Ok(())
    }
}
