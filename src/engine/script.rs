//! Render script generation.
//!
//! The generated script is a settings prelude followed by a fixed body. The
//! prelude carries everything that varies per render as a JSON object, plus
//! the caller's banner functions embedded verbatim.

use serde::Serialize;
use std::path::Path;
use url::Url;

use crate::options::{BannerInfo, RenderOptions};
use crate::{PhantomError, Result, Viewport};

/// The script ran to completion and wrote the output artifact.
pub const EXIT_OK: i32 = 0;

/// The document could not be loaded into the page.
pub const EXIT_LOAD_FAILED: i32 = 64;

/// The page never reported readiness within the JavaScript wait timeout.
pub const EXIT_READY_TIMEOUT: i32 = 65;

/// An uncaught error escaped the script itself (often a broken banner function).
pub const EXIT_SCRIPT_ERROR: i32 = 66;

const RENDER_SCRIPT_BODY: &str = r#"
var system = require('system');
var fs = require('fs');
var webpage = require('webpage');

function finish(code) {
  setTimeout(function () { phantom.exit(code); }, 0);
}

function banner(height, contents) {
  if (!contents) {
    return undefined;
  }
  return {
    height: height,
    contents: phantom.callback(function (pageNum, numPages) {
      return contents(pageNum, numPages);
    })
  };
}

phantom.onError = function (msg, trace) {
  system.stderr.writeLine('script error: ' + msg);
  phantom.exit(settings.exitScriptError);
};

var page = webpage.create();
page.viewportSize = settings.viewport;
page.zoomFactor = settings.zoomFactor;

var paperSize = {
  width: settings.paper.width,
  height: settings.paper.height,
  margin: settings.paper.margin
};
var header = banner(settings.headerHeight, headerContents);
if (header) {
  paperSize.header = header;
}
var footer = banner(settings.footerHeight, footerContents);
if (footer) {
  paperSize.footer = footer;
}
page.paperSize = paperSize;

page.onConsoleMessage = function (msg) {
  system.stdout.writeLine(msg);
};

page.onError = function (msg) {
  system.stderr.writeLine('page error: ' + msg);
};

var handled = false;
page.onLoadFinished = function (status) {
  if (handled) {
    return;
  }
  handled = true;

  if (status !== 'success') {
    system.stderr.writeLine('failed to load document: ' + status);
    finish(settings.exitLoadFailed);
    return;
  }

  var started = Date.now();
  var poll = function () {
    var ready = page.evaluate(function () {
      return document.readyState === 'complete' && window.renderReady !== false;
    });
    if (ready) {
      page.render(settings.outputPath, { format: settings.format, quality: 100 });
      finish(0);
    } else if (Date.now() - started >= settings.jsWaitTimeout) {
      system.stderr.writeLine('timed out after ' + settings.jsWaitTimeout + 'ms waiting for the page to become ready');
      finish(settings.exitReadyTimeout);
    } else {
      setTimeout(poll, settings.jsWaitInterval);
    }
  };
  poll();
};

page.setContent(fs.read(settings.inputPath), settings.baseUrl);
"#;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScriptSettings {
    input_path: String,
    output_path: String,
    base_url: String,
    format: &'static str,
    viewport: Viewport,
    zoom_factor: f64,
    paper: ScriptPaper,
    header_height: Option<String>,
    footer_height: Option<String>,
    js_wait_timeout: u64,
    js_wait_interval: u64,
    exit_load_failed: i32,
    exit_ready_timeout: i32,
    exit_script_error: i32,
}

#[derive(Debug, Serialize)]
struct ScriptPaper {
    width: String,
    height: String,
    margin: ScriptMargin,
}

#[derive(Debug, Serialize)]
struct ScriptMargin {
    top: String,
    right: String,
    bottom: String,
    left: String,
}

/// Builds the engine script that renders `input_path` into `output_path`.
///
/// Fails with [`PhantomError::InvalidConfiguration`] when `options` cannot
/// drive a render, such as [`RenderOptions::EMPTY`].
pub fn generate_render_script(
    options: &RenderOptions,
    input_path: &Path,
    output_path: &Path,
) -> Result<String> {
    options.validate()?;
    let paper = options.paper_size.ok_or_else(|| {
        PhantomError::invalid_configuration("render options carry no paper size")
    })?;
    let (width, height) = paper.oriented(options.orientation);

    let base_url = match &options.base_url {
        Some(url) => url.to_string(),
        None => Url::from_file_path(input_path)
            .map_err(|_| {
                PhantomError::invalid_configuration(format!(
                    "input path {} cannot be expressed as a file URL",
                    input_path.display()
                ))
            })?
            .to_string(),
    };

    let settings = ScriptSettings {
        input_path: input_path.to_string_lossy().into_owned(),
        output_path: output_path.to_string_lossy().into_owned(),
        base_url,
        format: options.format.as_str(),
        viewport: options.viewport,
        zoom_factor: options.zoom_factor,
        paper: ScriptPaper {
            width: width.to_string(),
            height: height.to_string(),
            margin: ScriptMargin {
                top: options.margins.top.to_string(),
                right: options.margins.right.to_string(),
                bottom: options.margins.bottom.to_string(),
                left: options.margins.left.to_string(),
            },
        },
        header_height: options.header.as_ref().map(|b| b.height().to_string()),
        footer_height: options.footer.as_ref().map(|b| b.height().to_string()),
        js_wait_timeout: millis(options.js_wait_timeout),
        js_wait_interval: millis(options.js_wait_interval),
        exit_load_failed: EXIT_LOAD_FAILED,
        exit_ready_timeout: EXIT_READY_TIMEOUT,
        exit_script_error: EXIT_SCRIPT_ERROR,
    };

    let mut script = String::with_capacity(RENDER_SCRIPT_BODY.len() + 1024);
    script.push_str("var settings = ");
    script.push_str(&serde_json::to_string(&settings)?);
    script.push_str(";\n");
    push_banner(&mut script, "headerContents", options.header.as_ref());
    push_banner(&mut script, "footerContents", options.footer.as_ref());
    script.push_str(RENDER_SCRIPT_BODY);
    Ok(script)
}

fn push_banner(script: &mut String, name: &str, banner: Option<&BannerInfo>) {
    match banner {
        // Newlines keep a trailing line comment in the source from eating the `);`.
        Some(banner) => {
            script.push_str("var ");
            script.push_str(name);
            script.push_str(" = (\n");
            script.push_str(&banner.function_source);
            script.push_str("\n);\n");
        }
        None => {
            script.push_str("var ");
            script.push_str(name);
            script.push_str(" = null;\n");
        }
    }
}

fn millis(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
