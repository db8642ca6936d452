use axum::{
    Json,
    http::{HeaderValue, Uri, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// HateoasResource
///
/// Links collected for a single response. Rendered as an RFC 8288 `Link` header so the
/// JSON body stays exactly what the profile handler returned.
#[derive(Debug, Clone, Default)]
pub struct HateoasResource {
    links: Vec<Link>,
}

impl HateoasResource {
    pub fn add_link(&mut self, rel: &str, href: &str) {
        self.links.push(Link {
            rel: rel.to_string(),
            href: href.to_string(),
        });
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn link_header(&self) -> Option<HeaderValue> {
        if self.links.is_empty() {
            return None;
        }
        let rendered = self
            .links
            .iter()
            .map(|l| format!("<{}>; rel=\"{}\"", l.href, l.rel))
            .collect::<Vec<_>>()
            .join(", ");
        HeaderValue::from_str(&rendered).ok()
    }
}

/// HateoasSupport
///
/// Extension point for enriching responses with links. The default does nothing.
pub trait HateoasSupport {
    fn update_response_for_hateoas(&self, _resource: &mut HateoasResource, _uri: &Uri) {}
}

/// respond
///
/// Wraps a handler result in a 200 JSON response after giving the controller's hook a
/// chance to attach links.
pub fn respond<C, T>(controller: &C, uri: &Uri, body: T) -> Response
where
    C: HateoasSupport + ?Sized,
    T: Serialize,
{
    let mut resource = HateoasResource::default();
    controller.update_response_for_hateoas(&mut resource, uri);

    let mut response = Json(body).into_response();
    if let Some(value) = resource.link_header() {
        response.headers_mut().insert(header::LINK, value);
    }
    response
}
