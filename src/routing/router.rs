use crate::http::error::HttpError;
use crate::http::request::Request;
use crate::http::response::{FileResponse, HandlerResponse, RedirectResponse, ResponseModel, StatusCode};
use crate::routing::RouteConfig;

/// Decides which response answers `request`.
///
/// First match wins:
/// 1. a redirect rule that accepts the target,
/// 2. a handler registered for exactly the target,
/// 3. a file under the document root.
pub fn route(request: &Request, config: &RouteConfig) -> Result<ResponseModel, HttpError> {
    let target = request.target.as_str();

    if let Some(redirect) = config.redirect() {
        if redirect.can_redirect(target) {
            let location = redirect.target_for(target);
            tracing::debug!(target = %target, location = %location, "Redirecting");
            return Ok(ResponseModel::Redirect(RedirectResponse::temporary(location)));
        }
    }

    if let Some(handler) = config.handler(target) {
        tracing::debug!(target = %target, "Dispatching to handler");
        return Ok(ResponseModel::Handler(HandlerResponse::new(handler)));
    }

    let path = config.resolver().resolve(target)?;
    tracing::debug!(target = %target, path = %path.as_path().display(), "Serving file");
    Ok(ResponseModel::File(FileResponse::from_path(
        path.into_path_buf(),
        StatusCode::Ok,
    )))
}
