//! BigQuery snapshot provider using INFORMATION_SCHEMA
//!
//! One query per dataset reads `COLUMNS`, joined with `COLUMN_FIELD_PATHS`
//! for top-level column descriptions and `TABLE_OPTIONS` for table
//! descriptions. Required IAM permissions:
//! - bigquery.tables.list
//! - bigquery.tables.get
//! - bigquery.jobs.create (to run the query)
//!
//! ## Authentication
//!
//! 1. Service account JSON key file (explicit path)
//! 2. Application Default Credentials (ADC)
//!
//! ## Usage
//!
//! ```rust,ignore
//! // Using ADC
//! let adapter = BigQueryAdapter::with_adc("my-project").await?;
//!
//! // Using service account file
//! let adapter = BigQueryAdapter::from_service_account_file(
//!     "my-project",
//!     "/path/to/service-account.json"
//! ).await?;
//! ```
//!
//! Reference: https://cloud.google.com/bigquery/docs/information-schema-columns

use crate::adapter::{FetchError, SnapshotProvider};
use sourcegen_core::{ColumnDescriptor, DatasetRef, DatasetSnapshot, TableDescriptor, TableFilter};

#[cfg(feature = "bigquery")]
use gcp_bigquery_client::{
    model::{
        get_query_results_parameters::GetQueryResultsParameters, job_reference::JobReference,
        query_request::QueryRequest, query_response::QueryResponse,
    },
    Client as BigQueryClient,
};

/// Server-side wait per request while the snapshot query runs
#[cfg(feature = "bigquery")]
const RESULT_WAIT_MS: i32 = 10_000;

/// Completion checks before a still-running query is reported as failed
#[cfg(feature = "bigquery")]
const MAX_RESULT_POLLS: u32 = 30;

#[cfg(not(feature = "bigquery"))]
const NOT_COMPILED: &str =
    "BigQuery support not compiled. Rebuild with: cargo build --features bigquery";

/// BigQuery snapshot provider
pub struct BigQueryAdapter {
    /// Project that runs (and is billed for) the queries
    project_id: String,

    #[cfg(feature = "bigquery")]
    client: BigQueryClient,
}

impl BigQueryAdapter {
    /// Create a new BigQuery adapter using Application Default Credentials (ADC)
    ///
    /// ADC automatically detects credentials from:
    /// - GOOGLE_APPLICATION_CREDENTIALS environment variable
    /// - gcloud CLI default credentials
    /// - GCE/GKE metadata service
    #[cfg(feature = "bigquery")]
    pub async fn with_adc(project_id: impl Into<String>) -> Result<Self, FetchError> {
        let client = BigQueryClient::from_application_default_credentials()
            .await
            .map_err(|e| {
                FetchError::AuthenticationError(format!(
                    "Failed to authenticate with ADC: {}. \
                     Ensure GOOGLE_APPLICATION_CREDENTIALS is set or run 'gcloud auth application-default login'",
                    e
                ))
            })?;

        Ok(Self {
            project_id: project_id.into(),
            client,
        })
    }

    #[cfg(not(feature = "bigquery"))]
    pub async fn with_adc(project_id: impl Into<String>) -> Result<Self, FetchError> {
        let _ = project_id.into();
        Err(FetchError::ConfigError(NOT_COMPILED.to_string()))
    }

    /// Create a new BigQuery adapter using a service account key file
    #[cfg(feature = "bigquery")]
    pub async fn from_service_account_file(
        project_id: impl Into<String>,
        key_path: impl AsRef<std::path::Path>,
    ) -> Result<Self, FetchError> {
        let key_path = key_path.as_ref().to_string_lossy().to_string();

        let client = BigQueryClient::from_service_account_key_file(&key_path)
            .await
            .map_err(|e| {
                FetchError::AuthenticationError(format!(
                    "Failed to read service account key file '{}': {}",
                    key_path, e
                ))
            })?;

        Ok(Self {
            project_id: project_id.into(),
            client,
        })
    }

    #[cfg(not(feature = "bigquery"))]
    pub async fn from_service_account_file(
        project_id: impl Into<String>,
        _key_path: impl AsRef<std::path::Path>,
    ) -> Result<Self, FetchError> {
        let _ = project_id.into();
        Err(FetchError::ConfigError(NOT_COMPILED.to_string()))
    }

    /// Project used to run queries
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

/// Build the snapshot query for one dataset
///
/// Project and dataset are spliced into a backtick-quoted path, so both are
/// checked for characters that could break out of it.
pub fn snapshot_query(dataset: &DatasetRef) -> Result<String, FetchError> {
    for part in [&dataset.project_id, &dataset.dataset_id] {
        if part.is_empty() || part.contains('`') || part.contains('\n') {
            return Err(FetchError::ConfigError(format!("Invalid BigQuery identifier: '{}'", part)));
        }
    }

    let path = format!("{}.{}.INFORMATION_SCHEMA", dataset.project_id, dataset.dataset_id);
    Ok(format!(
        r#"
        SELECT
            c.table_name,
            c.column_name,
            c.data_type,
            f.description AS column_description,
            o.option_value AS table_description
        FROM `{path}.COLUMNS` AS c
        LEFT JOIN `{path}.COLUMN_FIELD_PATHS` AS f
            ON f.table_name = c.table_name
            AND f.column_name = c.column_name
            AND f.field_path = c.column_name
        LEFT JOIN `{path}.TABLE_OPTIONS` AS o
            ON o.table_name = c.table_name
            AND o.option_name = 'description'
        ORDER BY c.table_name, c.ordinal_position
        "#
    ))
}

/// One row of the snapshot query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
    pub column_description: Option<String>,

    /// Raw `TABLE_OPTIONS.option_value`, still a quoted string literal
    pub table_description: Option<String>,
}

/// Group ordered query rows into table descriptors, applying `filter`
///
/// Rows must already be sorted by table name, as the query does.
pub fn tables_from_rows(
    rows: impl IntoIterator<Item = ColumnRow>,
    filter: &TableFilter,
) -> Vec<TableDescriptor> {
    let mut tables: Vec<TableDescriptor> = Vec::new();

    for row in rows {
        if !filter.matches(&row.table_name) {
            continue;
        }

        let is_new_table = tables.last().map_or(true, |t| t.table_id != row.table_name);
        if is_new_table {
            let mut table = TableDescriptor::new(row.table_name.clone());
            table.description = row.table_description.as_deref().and_then(unquote_option_value);
            tables.push(table);
        }

        let mut column = ColumnDescriptor::new(row.column_name, row.data_type);
        column.description = row.column_description.filter(|d| !d.is_empty());

        if let Some(table) = tables.last_mut() {
            table.columns.push(column);
        }
    }

    tables
}

/// Decode a `TABLE_OPTIONS` string literal such as `"Daily \"raw\" events"`
///
/// Returns `None` for empty descriptions.
pub fn unquote_option_value(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let value = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        serde_json::from_str::<String>(raw).unwrap_or_else(|_| raw[1..raw.len() - 1].to_string())
    } else {
        raw.to_string()
    };

    (!value.is_empty()).then_some(value)
}

/// Map a BigQuery error message to a fetch error
pub fn classify_error(message: String, dataset: &DatasetRef) -> FetchError {
    if message.contains("Not found") {
        FetchError::DatasetNotFound(dataset.fqn())
    } else if message.contains("Access Denied") || message.contains("Permission") {
        FetchError::PermissionDenied(format!("Cannot access {}: {}", dataset.fqn(), message))
    } else {
        FetchError::QueryError(message)
    }
}

#[cfg(feature = "bigquery")]
impl BigQueryAdapter {
    /// Fetch one page (or the completion state) of a running query job
    async fn query_results(
        &self,
        job: &JobReference,
        page_token: Option<String>,
        dataset: &DatasetRef,
    ) -> Result<QueryResponse, FetchError> {
        let job_id = job.job_id.as_deref().ok_or_else(|| {
            FetchError::InvalidResponse("Query response has no job reference".to_string())
        })?;

        let parameters = GetQueryResultsParameters {
            location: job.location.clone(),
            page_token,
            timeout_ms: Some(RESULT_WAIT_MS),
            ..Default::default()
        };

        self.client
            .job()
            .get_query_results(&self.project_id, job_id, parameters)
            .await
            .map(QueryResponse::from)
            .map_err(|e| classify_error(e.to_string(), dataset))
    }
}

/// Rows of one result page and the token of the next one
#[cfg(feature = "bigquery")]
#[derive(Debug)]
pub struct QueryPage {
    pub rows: Vec<ColumnRow>,
    pub page_token: Option<String>,
}

/// Decode one page of snapshot query results
///
/// A page of a job that has not completed carries no rows, so it is an
/// error rather than an empty dataset.
#[cfg(feature = "bigquery")]
pub fn read_page(response: QueryResponse) -> Result<QueryPage, FetchError> {
    use gcp_bigquery_client::model::query_response::ResultSet;

    if response.job_complete != Some(true) {
        return Err(FetchError::QueryError("Snapshot query did not complete in time".to_string()));
    }

    let page_token = response.page_token.clone().filter(|t| !t.is_empty());
    let mut rs = ResultSet::new_from_query_response(response);
    let mut rows = Vec::with_capacity(rs.row_count());

    while rs.next_row() {
        let field = |rs: &ResultSet, name: &str| {
            rs.get_string_by_name(name)
                .map_err(|e| FetchError::InvalidResponse(format!("Failed to get {}: {}", name, e)))
        };

        rows.push(ColumnRow {
            table_name: field(&rs, "table_name")?.unwrap_or_default(),
            column_name: field(&rs, "column_name")?.unwrap_or_default(),
            data_type: field(&rs, "data_type")?.unwrap_or_else(|| "UNKNOWN".to_string()),
            column_description: field(&rs, "column_description")?,
            table_description: field(&rs, "table_description")?,
        });
    }

    Ok(QueryPage { rows, page_token })
}

#[async_trait::async_trait]
impl SnapshotProvider for BigQueryAdapter {
    fn name(&self) -> &'static str {
        "BigQuery"
    }

    #[cfg(feature = "bigquery")]
    async fn fetch_dataset(
        &self,
        dataset: &DatasetRef,
        filter: &TableFilter,
    ) -> Result<DatasetSnapshot, FetchError> {
        let query = snapshot_query(dataset)?;
        tracing::debug!(dataset = %dataset, query = %query, "Querying INFORMATION_SCHEMA");

        let mut request = QueryRequest::new(query);
        request.timeout_ms = Some(RESULT_WAIT_MS);

        let mut response = self
            .client
            .job()
            .query(&self.project_id, request)
            .await
            .map_err(|e| classify_error(e.to_string(), dataset))?;

        let job = response.job_reference.clone().unwrap_or_default();
        let mut page_token: Option<String> = None;
        let mut polls = 0;
        let mut rows = Vec::new();

        loop {
            if response.job_complete != Some(true) && polls < MAX_RESULT_POLLS {
                polls += 1;
                tracing::debug!(dataset = %dataset, polls, "Query still running, waiting");
                response = self.query_results(&job, page_token.clone(), dataset).await?;
                continue;
            }

            let page = read_page(response)?;
            rows.extend(page.rows);

            match page.page_token {
                Some(token) => {
                    tracing::debug!(dataset = %dataset, rows = rows.len(), "Fetching next page");
                    page_token = Some(token);
                    response = self.query_results(&job, page_token.clone(), dataset).await?;
                }
                None => break,
            }
        }

        let tables = tables_from_rows(rows, filter);
        tracing::debug!(dataset = %dataset, tables = tables.len(), "Fetched dataset snapshot");

        Ok(DatasetSnapshot::new(dataset, tables))
    }

    #[cfg(not(feature = "bigquery"))]
    async fn fetch_dataset(
        &self,
        _dataset: &DatasetRef,
        _filter: &TableFilter,
    ) -> Result<DatasetSnapshot, FetchError> {
        Err(FetchError::ConfigError(NOT_COMPILED.to_string()))
    }

    #[cfg(feature = "bigquery")]
    async fn test_connection(&self) -> Result<(), FetchError> {
        self.client
            .job()
            .query(&self.project_id, QueryRequest::new("SELECT 1".to_string()))
            .await
            .map_err(|e| FetchError::QueryError(format!("Connection test failed: {}", e)))?;

        Ok(())
    }

    #[cfg(not(feature = "bigquery"))]
    async fn test_connection(&self) -> Result<(), FetchError> {
        Err(FetchError::ConfigError(NOT_COMPILED.to_string()))
    }
}
