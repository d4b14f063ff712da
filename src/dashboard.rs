//! Tab catalogue and the bundle of per-tab services

use crate::config::ApplicationConfig;
use crate::docdb::{DocDbExplorer, DocumentStore, HttpDocumentStore};
use crate::error::Result;
use crate::objects::{ObjectExplorer, ObjectStore, S3ObjectStore};
use crate::timeseries::{Dataset, VisualizationService};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Site name shown in the page header
pub const SITE_NAME: &str = "Panel Playground";

/// Page title
pub const PAGE_TITLE: &str = "Exploration and Demos";

/// Tab identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TabId {
    /// Rolling average and outliers
    Visualization,
    /// Greeting widget
    HelloWorld,
    /// Metadata search
    Docdb,
    /// Object browser
    Objects,
}

/// One entry of the tab bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tab {
    /// Identifier
    pub id: TabId,
    /// Title shown on the tab
    pub title: &'static str,
}

/// Tabs in display order
pub const TABS: [Tab; 4] = [
    Tab {
        id: TabId::Visualization,
        title: "Data Visualization Tutorial",
    },
    Tab {
        id: TabId::HelloWorld,
        title: "Hello World",
    },
    Tab {
        id: TabId::Docdb,
        title: "DocDB Explorer",
    },
    Tab {
        id: TabId::Objects,
        title: "S3 Explorer",
    },
];

/// Page chrome and tab bar
#[derive(Debug, Clone, Serialize)]
pub struct Catalogue {
    /// Site name
    pub site: &'static str,
    /// Page title
    pub title: &'static str,
    /// Tabs in display order
    pub tabs: &'static [Tab],
}

/// The page chrome and tab bar
pub fn catalogue() -> Catalogue {
    Catalogue {
        site: SITE_NAME,
        title: PAGE_TITLE,
        tabs: &TABS,
    }
}

/// Services behind the four tabs
///
/// The hello-world tab is stateless and needs no service.
pub struct Dashboard {
    /// Visualization tab
    pub visualization: VisualizationService,
    /// DocDB explorer tab
    pub docdb: DocDbExplorer,
    /// S3 explorer tab
    pub objects: ObjectExplorer,
    /// Options of the project multi-select
    pub project_options: Vec<String>,
    /// Bucket pre-filled in the S3 selector
    pub default_bucket: String,
}

impl Dashboard {
    /// Assemble a dashboard from already-built collaborators
    pub fn new(
        config: &ApplicationConfig,
        dataset: Arc<Dataset>,
        documents: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            visualization: VisualizationService::new(dataset, &config.dataset),
            docdb: DocDbExplorer::new(documents),
            objects: ObjectExplorer::new(
                objects,
                Duration::from_secs(config.object_store.presign_expiry_secs),
            ),
            project_options: config.docdb.project_options.clone(),
            default_bucket: config.object_store.default_bucket.clone(),
        }
    }

    /// Build the real HTTP and S3 clients from configuration
    ///
    /// The dataset is not read here; it loads on first use.
    pub async fn from_config(config: &ApplicationConfig) -> Result<Self> {
        let dataset = Arc::new(Dataset::from_path(&config.dataset.path));
        let documents = Arc::new(HttpDocumentStore::new(&config.docdb)?);
        let objects = Arc::new(S3ObjectStore::new(&config.object_store).await?);

        info!(
            dataset = %config.dataset.path.display(),
            docdb = %documents.endpoint(),
            "Dashboard services ready"
        );

        Ok(Self::new(config, dataset, documents, objects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_order() {
        let titles: Vec<&str> = TABS.iter().map(|t| t.title).collect();
        assert_eq!(
            titles,
            vec![
                "Data Visualization Tutorial",
                "Hello World",
                "DocDB Explorer",
                "S3 Explorer"
            ]
        );
    }

    #[test]
    fn test_catalogue_json() {
        let json = serde_json::to_value(catalogue()).unwrap();
        assert_eq!(json["site"], "Panel Playground");
        assert_eq!(json["title"], "Exploration and Demos");
        assert_eq!(json["tabs"][2]["id"], "docdb");
    }
}
