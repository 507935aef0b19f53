//! GitHub API Client
//!
//! Module for managing interactions with the GitHub labels API

use octocrab::Octocrab;
use serde::Serialize;

use crate::config::{Label, Repository};
use crate::error::{Error, Result};

/// Default GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const PAGE_SIZE: u32 = 100;

/// Label storage of one repository
///
/// Lists the current labels (observed side) and applies mutations to them.
/// Calls are issued one at a time by the reconciler.
#[allow(async_fn_in_trait)]
pub trait LabelService {
    /// Get all labels from the repository
    async fn list_labels(&self) -> Result<Vec<Label>>;

    /// Create a new label
    async fn create_label(&self, label: &Label) -> Result<Label>;

    /// Update the label currently named `name`
    async fn update_label(&self, name: &str, label: &Label) -> Result<Label>;

    /// Delete a label
    async fn delete_label(&self, name: &str) -> Result<()>;
}

/// Encode a string for use in URL path segments (RFC 3986 with UTF-8 support)
///
/// Only unreserved characters (A-Z, a-z, 0-9, -, ., _, ~) are left unencoded.
fn encode_path_segment(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            // RFC 3986 unreserved characters
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '.' | '_' | '~' => c.to_string(),
            // Everything else gets percent-encoded as UTF-8 bytes
            _ => c
                .to_string()
                .bytes()
                .map(|b| format!("%{:02X}", b))
                .collect::<String>(),
        })
        .collect()
}

/// Request body for label create/update
#[derive(Debug, Serialize, PartialEq)]
struct LabelPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    new_name: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,

    color: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> LabelPayload<'a> {
    fn create(label: &'a Label) -> Self {
        Self {
            new_name: None,
            name: Some(label.name.as_str()),
            color: label.normalized_color(),
            description: (!label.description.is_empty())
                .then_some(label.description.as_str()),
        }
    }

    fn update(current_name: &str, label: &'a Label) -> Self {
        Self {
            new_name: (current_name != label.name).then_some(label.name.as_str()),
            name: None,
            color: label.normalized_color(),
            // always sent so an empty description clears the current one
            description: Some(label.description.as_str()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ListParams {
    per_page: u32,
    page: u32,
}

/// GitHub API Client
///
/// Client responsible for label operations on one repository
pub struct GitHubClient {
    octocrab: Octocrab,
    repository: Repository,
}

impl GitHubClient {
    /// Create a new GitHub client
    ///
    /// # Arguments
    /// - `access_token`: GitHub access token
    /// - `api_url`: REST endpoint (GitHub.com or a GitHub Enterprise API root)
    /// - `repository`: Target repository
    ///
    /// # Errors
    /// Returns an error if client initialization fails
    pub fn new(access_token: &str, api_url: &str, repository: Repository) -> Result<Self> {
        let octocrab = Octocrab::builder()
            .personal_token(access_token.to_string())
            .base_uri(api_url)
            .map_err(|e| Error::config_validation(format!("Invalid API URL {api_url}: {e}")))?
            .build()
            .map_err(|e| Error::generic(format!("Failed to create GitHub client: {e}")))?;

        Ok(Self {
            octocrab,
            repository,
        })
    }

    fn labels_route(&self) -> String {
        format!(
            "/repos/{}/{}/labels",
            self.repository.owner, self.repository.name
        )
    }

    fn label_route(&self, name: &str) -> String {
        format!("{}/{}", self.labels_route(), encode_path_segment(name))
    }
}

impl LabelService for GitHubClient {
    async fn list_labels(&self) -> Result<Vec<Label>> {
        let route = self.labels_route();
        let mut labels = Vec::new();
        let mut page = 1u32;

        loop {
            tracing::debug!(repository = %self.repository, page, "Listing labels");

            let params = ListParams {
                per_page: PAGE_SIZE,
                page,
            };
            let items: Vec<Label> = self
                .octocrab
                .get(&route, Some(&params))
                .await
                .map_err(|e| match Error::from(e) {
                    e if e.status() == Some(404) => {
                        Error::RepositoryNotFound(self.repository.to_string())
                    }
                    e => e,
                })?;

            if items.is_empty() {
                break;
            }

            let last_page = items.len() < PAGE_SIZE as usize;
            labels.extend(items.into_iter().map(|mut label| {
                label.color = label.normalized_color();
                label
            }));

            if last_page {
                break;
            }
            page += 1;
        }

        Ok(labels)
    }

    async fn create_label(&self, label: &Label) -> Result<Label> {
        tracing::debug!(repository = %self.repository, label = %label.name, "Creating label");

        let created: Label = self
            .octocrab
            .post(self.labels_route(), Some(&LabelPayload::create(label)))
            .await?;

        Ok(created)
    }

    async fn update_label(&self, name: &str, label: &Label) -> Result<Label> {
        tracing::debug!(repository = %self.repository, label = %name, "Updating label");

        let updated: Label = self
            .octocrab
            .patch(self.label_route(name), Some(&LabelPayload::update(name, label)))
            .await?;

        Ok(updated)
    }

    async fn delete_label(&self, name: &str) -> Result<()> {
        tracing::debug!(repository = %self.repository, label = %name, "Deleting label");

        // URL encode the label name to handle spaces, special characters, and UTF-8
        self.octocrab
            .issues(&self.repository.owner, &self.repository.name)
            .delete_label(encode_path_segment(name))
            .await?;

        Ok(())
    }
}
