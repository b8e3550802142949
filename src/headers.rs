use axum::http::header::{LINK, LOCATION};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Uri};

use crate::pagination::Page;

pub const X_TOTAL_COUNT: HeaderName = HeaderName::from_static("x-total-count");

/// Build `X-Total-Count` and an RFC 5988 `Link` header for `page`. Links keep
/// every query parameter of `uri` except `page` and `size`, which are rewritten.
pub fn pagination_headers<T>(base_url: &str, uri: &Uri, page: &Page<T>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(X_TOTAL_COUNT, HeaderValue::from(page.total));

    let total_pages = page.total_pages();
    let mut links = Vec::with_capacity(4);
    if page.page + 1 < total_pages {
        links.push(link(base_url, uri, page.page + 1, page.size, "next"));
    }
    if page.page > 0 {
        links.push(link(base_url, uri, page.page - 1, page.size, "prev"));
    }
    let last = total_pages.saturating_sub(1);
    links.push(link(base_url, uri, last, page.size, "last"));
    links.push(link(base_url, uri, 0, page.size, "first"));

    match HeaderValue::from_str(&links.join(",")) {
        Ok(value) => {
            headers.insert(LINK, value);
        }
        Err(e) => tracing::warn!("Skipping Link header: {e}"),
    }
    headers
}

fn link(base_url: &str, uri: &Uri, page: u64, size: u64, rel: &str) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(uri.query().unwrap_or("").as_bytes()) {
        if key != "page" && key != "size" {
            query.append_pair(&key, &value);
        }
    }
    query.append_pair("page", &page.to_string());
    query.append_pair("size", &size.to_string());

    format!(
        "<{}{}?{}>; rel=\"{rel}\"",
        base_url.trim_end_matches('/'),
        uri.path(),
        query.finish()
    )
}

/// Header names for entity alerts, derived once from the application name.
#[derive(Debug, Clone)]
pub struct AlertHeaders {
    app_name: String,
    alert: HeaderName,
    params: HeaderName,
}

impl AlertHeaders {
    pub fn new(app_name: &str) -> Result<Self, String> {
        let alert = HeaderName::from_bytes(format!("X-{app_name}-alert").as_bytes())
            .map_err(|e| format!("Invalid application name '{app_name}': {e}"))?;
        let params = HeaderName::from_bytes(format!("X-{app_name}-params").as_bytes())
            .map_err(|e| format!("Invalid application name '{app_name}': {e}"))?;
        Ok(Self {
            app_name: app_name.to_string(),
            alert,
            params,
        })
    }

    /// Alert headers for a created entity, plus `Location` pointing at it.
    pub fn created(&self, entity: &str, location: &str, id: &str) -> HeaderMap {
        let mut headers = self.alert(entity, "created", id);
        if let Ok(value) = HeaderValue::from_str(location) {
            headers.insert(LOCATION, value);
        }
        headers
    }

    pub fn updated(&self, entity: &str, id: &str) -> HeaderMap {
        self.alert(entity, "updated", id)
    }

    pub fn deleted(&self, entity: &str, id: &str) -> HeaderMap {
        self.alert(entity, "deleted", id)
    }

    fn alert(&self, entity: &str, action: &str, id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let message = format!("{}.{entity}.{action}", self.app_name);
        if let Ok(value) = HeaderValue::from_str(&message) {
            headers.insert(self.alert.clone(), value);
        }
        if let Ok(value) = HeaderValue::from_str(id) {
            headers.insert(self.params.clone(), value);
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PageRequest;

    fn links(headers: &HeaderMap) -> String {
        headers[LINK].to_str().unwrap().to_string()
    }

    #[test]
    fn middle_page_has_all_four_links() {
        let uri: Uri = "/api/submissions?user=bob&page=1&size=2&sort=id,desc"
            .parse()
            .unwrap();
        let request = PageRequest::new(1, 2, vec![]).unwrap();
        let page = Page::new(vec![(), ()], 5, &request);

        let headers = pagination_headers("http://localhost:8080", &uri, &page);

        assert_eq!(headers[X_TOTAL_COUNT], "5");
        assert_eq!(
            links(&headers),
            "<http://localhost:8080/api/submissions?user=bob&sort=id%2Cdesc&page=2&size=2>; rel=\"next\",\
             <http://localhost:8080/api/submissions?user=bob&sort=id%2Cdesc&page=0&size=2>; rel=\"prev\",\
             <http://localhost:8080/api/submissions?user=bob&sort=id%2Cdesc&page=2&size=2>; rel=\"last\",\
             <http://localhost:8080/api/submissions?user=bob&sort=id%2Cdesc&page=0&size=2>; rel=\"first\""
        );
    }

    #[test]
    fn empty_result_links_first_and_last_to_page_zero() {
        let uri: Uri = "/api/assessments".parse().unwrap();
        let request = PageRequest::new(0, 20, vec![]).unwrap();
        let page: Page<()> = Page::empty(&request);

        let headers = pagination_headers("", &uri, &page);

        assert_eq!(headers[X_TOTAL_COUNT], "0");
        assert_eq!(
            links(&headers),
            "</api/assessments?page=0&size=20>; rel=\"last\",</api/assessments?page=0&size=20>; rel=\"first\""
        );
    }

    #[test]
    fn alert_headers_use_application_name() {
        let alerts = AlertHeaders::new("catApp").unwrap();
        let headers = alerts.created("submission", "/api/submissions/42", "42");
        assert_eq!(headers["x-catapp-alert"], "catApp.submission.created");
        assert_eq!(headers["x-catapp-params"], "42");
        assert_eq!(headers[LOCATION], "/api/submissions/42");
    }

    #[test]
    fn rejects_application_name_with_spaces() {
        assert!(AlertHeaders::new("cat app").is_err());
    }
}
