//! Asset transforms plugged into the pipeline stages.
//!
//! | Transform     | Stage             | Library      |
//! |---------------|-------------------|--------------|
//! | `DataMinify`  | `minify-xml-json` | serde_json, quick-xml |
//! | `CssMinify`   | `minify-css`      | lightningcss |
//! | `JsMinify`    | `minify-js`       | oxc          |
//! | `SvgOptimize` | `optimize-svg`    | usvg         |
//! | `InlineSvg`, `HtmlMinify` | `minify-html` | -    |

mod data;
mod html;
mod minify;
mod svg;

pub use data::{DataMinify, minify_xml};
pub use html::{HtmlMinify, InlineSvg};
pub use minify::{CssMinify, JsMinify, minify_js};
pub use svg::SvgOptimize;
