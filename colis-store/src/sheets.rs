use async_trait::async_trait;
use colis_core::{
    Account, AccountDirectory, CoreError, CoreResult, ReferenceRows, ReferenceSource, RowStore,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::app_config::SheetsConfig;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const ACCOUNTS_RANGE: &str = "compte!A:B";
const REFERENCE_RANGES: [&str; 3] = ["code wilayas!A:D", "code communes!A:B", "code stations!A:B"];
/// Refresh the access token this long before Google says it expires.
const TOKEN_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Google Sheets v4 client acting as a service account.
///
/// Each tenant partition is a sheet of the configured spreadsheet. The
/// account and reference sheets live in the same spreadsheet.
pub struct SheetsClient {
    http: Client,
    config: SheetsConfig,
    key: EncodingKey,
    token: RwLock<Option<AccessToken>>,
}

impl SheetsClient {
    pub fn new(config: SheetsConfig) -> CoreResult<Self> {
        if config.spreadsheet_id.is_empty() || config.client_email.is_empty() {
            return Err(CoreError::StoreError(
                "sheets.spreadsheet_id and sheets.client_email must be set".into(),
            ));
        }
        let pem = config.private_key.replace("\\n", "\n");
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| CoreError::StoreError(format!("Invalid service account key: {}", e)))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(store_error)?;

        Ok(Self {
            http,
            config,
            key,
            token: RwLock::new(None),
        })
    }

    async fn access_token(&self) -> CoreResult<String> {
        if let Some(token) = self.token.read().await.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let mut slot = self.token.write().await;
        if let Some(token) = slot.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }
        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.config.client_email,
            scope: SCOPE,
            aud: &self.config.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| CoreError::StoreError(format!("Token signing failed: {}", e)))?;

        let response = self
            .http
            .post(&self.config.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(store_error)?;
        let token: TokenResponse = read_json(response).await?;
        debug!(expires_in = token.expires_in, "google access token refreshed");

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_MARGIN);
        *slot = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    fn url(&self, segments: &[&str]) -> CoreResult<Url> {
        let mut url = Url::parse(SHEETS_API).map_err(store_error)?;
        url.path_segments_mut()
            .map_err(|_| CoreError::StoreError("Sheets API url cannot take a path".into()))?
            .push(&self.config.spreadsheet_id)
            .extend(segments);
        Ok(url)
    }

    /// Same as [`url`](Self::url) but with `:verb` glued to the last segment.
    fn action_url(&self, segments: &[&str], verb: &str) -> CoreResult<Url> {
        let mut url = self.url(segments)?;
        let path = format!("{}:{}", url.path(), verb);
        url.set_path(&path);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder + Send,
    ) -> CoreResult<T> {
        let token = self.access_token().await?;
        let request = build(self.http.request(method, url).bearer_auth(token));
        let response = request.send().await.map_err(store_error)?;
        read_json(response).await
    }

    async fn get_values(&self, range: &str) -> CoreResult<Vec<Vec<String>>> {
        let url = self.url(&["values", range])?;
        let body: ValueRange = self.send(Method::GET, url, |r| r).await?;
        Ok(body.values)
    }

    async fn put_values(&self, range: &str, values: Value) -> CoreResult<()> {
        let url = self.url(&["values", range])?;
        let _: Value = self
            .send(Method::PUT, url, |r| {
                r.query(&[("valueInputOption", "RAW")])
                    .json(&json!({ "values": values }))
            })
            .await?;
        Ok(())
    }

    async fn sheet_id(&self, partition: &str) -> CoreResult<i64> {
        let url = self.url(&[])?;
        let body: Value = self
            .send(Method::GET, url, |r| {
                r.query(&[("fields", "sheets.properties(sheetId,title)")])
            })
            .await?;
        find_sheet_id(&body, partition)
            .ok_or_else(|| CoreError::StoreError(format!("Sheet {} not found", partition)))
    }
}

#[async_trait]
impl RowStore for SheetsClient {
    async fn get_all_rows(&self, partition: &str) -> CoreResult<Vec<Vec<String>>> {
        self.get_values(&sheet_range(partition, "A:Z")).await
    }

    async fn append_row(&self, partition: &str, row: &[String]) -> CoreResult<u32> {
        let url = self.action_url(&["values", &sheet_range(partition, "A:Z")], "append")?;
        let body: Value = self
            .send(Method::POST, url, |r| {
                r.query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
                    .json(&json!({ "values": [row] }))
            })
            .await?;

        let range = body["updates"]["updatedRange"].as_str().unwrap_or_default();
        let row_index = parse_updated_row(range).ok_or_else(|| {
            CoreError::StoreError(format!("Unexpected append range: {:?}", range))
        })?;
        info!(partition, row_index, "row appended");
        Ok(row_index)
    }

    async fn update_row(&self, partition: &str, row_index: u32, row: &[String]) -> CoreResult<()> {
        let cells = format!("A{}:Z{}", row_index, row_index);
        self.put_values(&sheet_range(partition, &cells), json!([row]))
            .await?;
        info!(partition, row_index, "row updated");
        Ok(())
    }

    async fn delete_row(&self, partition: &str, row_index: u32) -> CoreResult<()> {
        let sheet_id = self.sheet_id(partition).await?;
        let start = row_index.saturating_sub(1);
        let url = self.action_url(&[], "batchUpdate")?;
        let _: Value = self
            .send(Method::POST, url, |r| {
                r.json(&json!({
                    "requests": [{
                        "deleteDimension": {
                            "range": {
                                "sheetId": sheet_id,
                                "dimension": "ROWS",
                                "startIndex": start,
                                "endIndex": start + 1,
                            }
                        }
                    }]
                }))
            })
            .await?;
        info!(partition, row_index, "row deleted");
        Ok(())
    }

    async fn update_cell(
        &self,
        partition: &str,
        row_index: u32,
        column_index: usize,
        value: &str,
    ) -> CoreResult<()> {
        let cell = format!("{}{}", column_letter(column_index), row_index);
        self.put_values(&sheet_range(partition, &cell), json!([[value]]))
            .await?;
        info!(partition, cell = %cell, "cell updated");
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for SheetsClient {
    async fn find_account(&self, code: &str) -> CoreResult<Option<Account>> {
        let rows = self.get_values(ACCOUNTS_RANGE).await?;
        Ok(rows
            .into_iter()
            .find(|row| row.first().map(String::as_str) == Some(code))
            .map(|row| Account {
                code: code.to_string(),
                role: row.get(1).cloned().unwrap_or_default(),
            }))
    }
}

#[async_trait]
impl ReferenceSource for SheetsClient {
    async fn reference_rows(&self) -> CoreResult<ReferenceRows> {
        let url = self.action_url(&["values"], "batchGet")?;
        let query: Vec<(&str, &str)> = REFERENCE_RANGES.iter().map(|r| ("ranges", *r)).collect();

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct BatchGet {
            #[serde(default)]
            value_ranges: Vec<ValueRange>,
        }
        let body: BatchGet = self.send(Method::GET, url, |r| r.query(&query)).await?;

        let mut ranges = body.value_ranges.into_iter().map(|r| r.values);
        Ok(ReferenceRows {
            wilayas: ranges.next().unwrap_or_default(),
            communes: ranges.next().unwrap_or_default(),
            stations: ranges.next().unwrap_or_default(),
        })
    }

    async fn column_validation(&self, partition: &str, column: &str) -> CoreResult<Option<Value>> {
        let sheet_id = self.sheet_id(partition).await?;
        let range = sheet_range(partition, &format!("{}:{}", column, column));
        let url = self.url(&[])?;
        let body: Value = self
            .send(Method::GET, url, |r| {
                r.query(&[
                    ("ranges", range.as_str()),
                    (
                        "fields",
                        "sheets(properties(sheetId,title),data(rowData(values(dataValidation))))",
                    ),
                ])
            })
            .await?;
        Ok(first_validation(&body, sheet_id))
    }
}

fn store_error(e: impl std::fmt::Display) -> CoreError {
    CoreError::StoreError(e.to_string())
}

/// Decodes a Google API response, turning error statuses into the message
/// Google put in the body.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> CoreResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body: Value = response.json().await.unwrap_or(Value::Null);
        let message = body["error"]["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Google API returned {}", status));
        return Err(CoreError::StoreError(message));
    }
    response.json().await.map_err(store_error)
}

/// A1 range on a named sheet, quoting the name.
pub fn sheet_range(sheet: &str, cells: &str) -> String {
    format!("'{}'!{}", sheet.replace('\'', "''"), cells)
}

/// 0 → A, 25 → Z, 26 → AA.
pub fn column_letter(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Row number of an `updatedRange` such as `'alger'!A5:T5`.
pub fn parse_updated_row(range: &str) -> Option<u32> {
    let cells = range.rsplit_once('!').map_or(range, |(_, cells)| cells);
    let start = cells.split(':').next()?;
    start
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse()
        .ok()
}

fn find_sheet_id(spreadsheet: &Value, title: &str) -> Option<i64> {
    spreadsheet["sheets"]
        .as_array()?
        .iter()
        .map(|s| &s["properties"])
        .find(|p| p["title"].as_str() == Some(title))
        .and_then(|p| p["sheetId"].as_i64())
}

fn first_validation(spreadsheet: &Value, sheet_id: i64) -> Option<Value> {
    let sheet = spreadsheet["sheets"]
        .as_array()?
        .iter()
        .find(|s| s["properties"]["sheetId"].as_i64() == Some(sheet_id))?;
    sheet["data"][0]["rowData"]
        .as_array()?
        .iter()
        .find_map(|row| {
            let rule = &row["values"][0]["dataValidation"];
            (!rule.is_null()).then(|| rule.clone())
        })
}
