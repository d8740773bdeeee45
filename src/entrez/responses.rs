use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ESearchResult {
    pub esearchresult: ESearchData,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ESearchData {
    /// NCBI sometimes reports failures as 200 OK with an ERROR field
    #[serde(default, rename = "ERROR")]
    pub error: Option<String>,
    #[serde(default)]
    pub count: Option<String>,
    /// WebEnv session identifier for the history server
    #[serde(default)]
    pub webenv: Option<String>,
    /// Query key within the history session
    #[serde(default, rename = "querykey")]
    pub query_key: Option<String>,
}
