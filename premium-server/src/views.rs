//! HTML views
//!
//! Server-rendered pages. Every dynamic string goes through `escape`.

use std::fmt::Write;

use premium_core::constants::APP_NAME;
use premium_core::logic::bmi::BmiOutcome;
use premium_core::logic::features::{Categorical, Region};
use premium_core::PresentedResult;

/// Minimal HTML escaping for text and attribute values
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {app}</title>
</head>
<body>
<nav>
  <a href="/">Home</a>
  <a href="/bmi">BMI Calculator</a>
  <a href="/howitworks">How it works</a>
  <a href="/about">About</a>
  <a href="/contact">Contact</a>
</nav>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
        app = escape(APP_NAME),
    )
}

// ============================================================================
// PREMIUM
// ============================================================================

pub fn home() -> String {
    let regions: String = Region::VOCABULARY
        .iter()
        .map(|(name, _)| format!(r#"<option value="{0}">{0}</option>"#, name))
        .collect();

    let body = format!(
        r#"<h1>Estimate your insurance premium</h1>
<form method="post" action="/predict">
  <label>Age <input name="age" type="number" min="0" step="1"></label>
  <label>Sex
    <select name="sex"><option value="male">male</option><option value="female">female</option></select>
  </label>
  <label>BMI <input name="bmi" type="number" min="0" step="0.01"></label>
  <label>Children <input name="children" type="number" min="0" step="1"></label>
  <label>Smoker
    <select name="smoker"><option value="no">no</option><option value="yes">yes</option></select>
  </label>
  <label>Region <select name="region">{regions}</select></label>
  <button type="submit">Predict</button>
</form>
<p>Not sure about your BMI? Use the <a href="/bmi">BMI calculator</a>.</p>"#
    );
    layout("Home", &body)
}

pub fn prediction(view: &PresentedResult) -> String {
    let mut body = String::from("<h1>Your estimate</h1>\n");

    if let Some(error) = &view.error_message {
        let _ = writeln!(body, r#"<div class="banner error">{}</div>"#, escape(error));
    }
    let _ = writeln!(body, r#"<p class="premium">{}</p>"#, escape(&view.premium_text));

    if let Some(advisory) = &view.anomaly_message {
        let _ = write!(body, r#"<div class="banner warning">{}"#, escape(advisory));
        if let Some(score) = &view.anomaly_score {
            let _ = write!(body, r#" <small>(score {})</small>"#, escape(score));
        }
        body.push_str("</div>\n");
    }

    if !view.top_factors.is_empty() {
        body.push_str("<h2>What drove this estimate</h2>\n<ol class=\"factors\">\n");
        for factor in &view.top_factors {
            let _ = writeln!(
                body,
                "  <li>{} <strong>{}</strong></li>",
                escape(&factor.name),
                escape(&factor.signed_amount)
            );
        }
        body.push_str("</ol>\n");
        if let Some(base) = &view.base_value {
            let _ = writeln!(body, "<p>Typical applicant baseline: {}</p>", escape(base));
        }
    }

    body.push_str(r#"<p><a href="/">Try another estimate</a></p>"#);
    layout("Estimate", &body)
}

// ============================================================================
// BMI
// ============================================================================

pub fn bmi(outcome: Option<&BmiOutcome>) -> String {
    let mut body = String::from(
        r#"<h1>BMI calculator</h1>
<form method="post" action="/bmi">
  <label>Weight (kg) <input name="weight" type="number" min="0" step="0.1"></label>
  <label>Height (cm) <input name="height" type="number" min="0" step="0.1"></label>
  <button type="submit">Calculate</button>
</form>
"#,
    );

    match outcome {
        Some(BmiOutcome::Reading(reading)) => {
            let _ = writeln!(
                body,
                r#"<p class="bmi">Your BMI is <strong>{:.2}</strong> ({})</p>"#,
                reading.value,
                escape(reading.category.label())
            );
        }
        Some(invalid @ BmiOutcome::Invalid) => {
            let _ = writeln!(body, r#"<p class="bmi error">{}</p>"#, escape(&invalid.display_value()));
        }
        None => {}
    }

    layout("BMI", &body)
}

// ============================================================================
// STATIC PAGES
// ============================================================================

pub fn about() -> String {
    layout(
        "About",
        r#"<h1>About</h1>
<p>This service estimates a yearly health insurance premium from six
applicant attributes: age, sex, BMI, number of children, smoking status and
region. Estimates come from a regression model trained on historical
policies and are indicative only.</p>"#,
    )
}

pub fn how_it_works() -> String {
    layout(
        "How it works",
        r#"<h1>How it works</h1>
<ol>
  <li>Your answers are checked and encoded into six numeric features.</li>
  <li>An anomaly detector looks for unusual combinations and may ask you to
      double-check your details.</li>
  <li>The regression model predicts the premium.</li>
  <li>Each feature's contribution is measured against a typical applicant and
      the strongest three are shown next to the estimate.</li>
</ol>"#,
    )
}

pub fn contact() -> String {
    layout(
        "Contact",
        r#"<h1>Contact</h1>
<p>Questions about an estimate? Write to
<a href="mailto:support@premium-estimator.example">support@premium-estimator.example</a>.</p>"#,
    )
}
