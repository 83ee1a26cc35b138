use std::convert::Infallible;

use axum::{Extension, Router, extract::FromRequestParts, http::request::Parts};

use crate::i18n::Locale;

/// 无前缀路径使用默认语言，`/{locale}/...` 使用对应语言；
/// 不支持的语言前缀匹配不到任何路由，直接 404
pub fn with_locale_prefixes<S>(routes: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let mut router = routes.clone().layer(Extension(Locale::DEFAULT));
    for locale in Locale::SUPPORTED {
        router = router.nest(
            &format!("/{}", locale.as_str()),
            routes.clone().layer(Extension(locale)),
        );
    }
    router
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Locale>().copied().unwrap_or_default())
    }
}
