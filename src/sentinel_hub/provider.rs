use super::{Credentials, ErrorBody, TokenResponse};
use crate::area::{GeoBoundingBox, TimeInterval};
use crate::catalog::{Catalog, CatalogSearch, ImageService, SearchPage};
use crate::error::{Error, Result};
use crate::image_request::ImageRequest;
use crate::scene::SceneRecord;
use crate::settings::Settings;
use reqwest::header::ACCEPT;
use reqwest::{Response, StatusCode};
use tokio::sync::OnceCell;
use tracing::{debug, info};

pub struct Provider {
    client: reqwest::Client,
    credentials: Credentials,
    settings: Settings,
    token: OnceCell<String>,
}

impl Provider {
    pub fn new(credentials: Credentials, settings: Settings) -> Self {
        Self::with_client(reqwest::Client::new(), credentials, settings)
    }

    pub fn with_client(
        client: reqwest::Client,
        credentials: Credentials,
        settings: Settings,
    ) -> Self {
        Self {
            client,
            credentials,
            settings,
            token: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Exchanges the client credentials for a bearer token. The token is
    /// cached for the lifetime of the provider.
    pub async fn authenticate(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| self.fetch_token())
            .await?;
        Ok(token.as_str())
    }

    async fn fetch_token(&self) -> Result<String> {
        debug!(client_id = %self.credentials.client_id, "requesting access token");
        let response = self
            .client
            .post(self.settings.service.auth_url.clone())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            return Err(Error::Authentication(body.message(status.as_str())));
        }

        let token: TokenResponse = check_status(response).await?.json().await?;
        info!("authenticated");
        Ok(token.access_token)
    }

    async fn search_page(&self, search: &CatalogSearch) -> Result<SearchPage> {
        let token = self.authenticate().await?;
        let response = self
            .client
            .post(self.settings.service.catalog_url.clone())
            .bearer_auth(token)
            .json(search)
            .send()
            .await?;
        let page: SearchPage = check_status(response).await?.json().await?;
        Ok(page)
    }
}

impl Catalog for Provider {
    async fn search(
        &self,
        bbox: &GeoBoundingBox,
        interval: &TimeInterval,
    ) -> Result<Vec<SceneRecord>> {
        let mut search = CatalogSearch::new(
            &self.settings.request.collection,
            bbox,
            interval,
            self.settings.service.page_limit,
        );

        let mut scenes = vec![];
        loop {
            let page = self.search_page(&search).await?;
            debug!(returned = page.features.len(), next = ?page.context.next, "catalog page");
            scenes.extend(page.features);
            match page.context.next {
                Some(next) => search = search.with_next(next),
                None => break,
            }
        }
        Ok(scenes)
    }
}

impl ImageService for Provider {
    async fn fetch(&self, request: &ImageRequest) -> Result<Vec<u8>> {
        let token = self.authenticate().await?;
        let (width, height) = request.dimensions();
        info!(width, height, style = %request.style(), "requesting image");

        let response = self
            .client
            .post(self.settings.service.process_url.clone())
            .bearer_auth(token)
            .header(ACCEPT, request.encoding().mime_type())
            .json(&request.payload())
            .send()
            .await?;
        let bytes = check_status(response).await?.bytes().await?;
        debug!(size = bytes.len(), "image received");
        Ok(bytes.to_vec())
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = body.message(&status.to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Authentication(message)),
        _ => Err(Error::Service {
            status: status.as_u16(),
            message,
        }),
    }
}
