//! Static informational page served at `/`.

use axum::http::{header, HeaderValue};
use axum::response::{Html, IntoResponse, Response};

const INFO_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Frame Proxy</title>
    <style>
        body { font-family: Arial, sans-serif; line-height: 1.6; margin: 0; padding: 20px;
               background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; min-height: 100vh; }
        .container { max-width: 800px; margin: 0 auto; background: rgba(255, 255, 255, 0.1);
                     border-radius: 15px; padding: 30px; }
        .status { background: rgba(40, 167, 69, 0.2); border: 2px solid #28a745; border-radius: 10px;
                  padding: 20px; margin: 20px 0; text-align: center; }
        .usage { background: rgba(23, 162, 184, 0.2); border: 2px solid #17a2b8; border-radius: 10px;
                 padding: 20px; margin: 20px 0; }
        code { background: rgba(0, 0, 0, 0.3); padding: 4px 8px; border-radius: 4px; font-family: monospace; }
        a { color: white; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Frame Proxy</h1>
        <div class="status">
            <h2>Proxy is running</h2>
            <p>Fetches pages on behalf of an embedding application and strips the headers that block iframe embedding.</p>
        </div>
        <div class="usage">
            <h3>Usage</h3>
            <p><code>/proxy?url=&lt;target&gt;</code></p>
            <ul>
                <li><code>/proxy?url=https://www.example.com</code></li>
                <li><code>/proxy?url=www.example.com</code> (https is assumed)</li>
                <li><code>POST /proxy?url=https://httpbin.org/post</code> forwards the request body</li>
            </ul>
            <h3>Behaviour</h3>
            <ul>
                <li>X-Frame-Options and Content-Security-Policy are removed</li>
                <li>CORS headers are added to every proxied response</li>
                <li>Relative links in HTML are made absolute</li>
                <li>Link clicks and form submissions are posted to the parent window</li>
            </ul>
        </div>
        <p><a href="/proxy?url=https://www.example.com" target="_blank">Try example.com</a></p>
    </div>
</body>
</html>
"#;

/// `GET /` (HEAD is answered by the router with the same headers).
pub async fn info_page() -> Response {
    let mut response = Html(INFO_PAGE).into_response();
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}
