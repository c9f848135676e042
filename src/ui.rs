use crate::grid::{GridSlot, is_pending};
use crate::models::Frequency;
use crate::stats::{GardenSummary, wilting_reminder};

pub fn render_garden(
    user_name: &str,
    slots: &[GridSlot],
    summary: &GardenSummary,
    flash: Option<&str>,
) -> String {
    let pots: String = slots
        .iter()
        .enumerate()
        .map(|(index, slot)| render_pot(index, slot))
        .collect();

    let body = GARDEN_HTML
        .replace("{{USER}}", &escape_html(user_name))
        .replace("{{FLASH}}", &render_flash(flash))
        .replace("{{REMINDER}}", &render_reminder(slots))
        .replace("{{OCCUPIED}}", &summary.occupied.to_string())
        .replace("{{PENDING}}", &summary.pending.to_string())
        .replace("{{DONE}}", &summary.done.to_string())
        .replace("{{WILTING}}", &summary.wilting.to_string())
        .replace("{{POTS}}", &pots);
    page("Pot Your Progress", &body)
}

fn render_pot(index: usize, slot: &GridSlot) -> String {
    let Some(habit) = slot.habit() else {
        return format!(
            r#"<div class="pot empty" data-slot="{index}"><span class="plant">&#x1FAB4;</span><p class="name">Empty pot</p></div>"#
        );
    };

    let plant = if habit.is_wilting() { "&#x1F940;" } else { "&#x1F331;" };
    let water = if is_pending(slot) {
        format!(
            r#"<form method="post" action="/habits/{index}/track"><button class="droplet" type="submit" title="Water">&#x1F4A7;</button></form>"#
        )
    } else {
        r#"<span class="watered">Watered</span>"#.to_string()
    };
    let name = escape_html(&habit.name);

    format!(
        r#"<div class="pot{wilting}" data-slot="{index}">
  <span class="plant">{plant}</span>
  <p class="name">{name}</p>
  <p class="frequency">{frequency}</p>
  {water}
  <details>
    <summary>Edit</summary>
    <form method="post" action="/habits/{index}/edit">
      <input name="habit_name" value="{name}" required />
      {options}
      <button type="submit">Save</button>
    </form>
  </details>
  <form method="post" action="/habits/{index}/delete"><button class="shovel" type="submit">Dig up</button></form>
</div>"#,
        wilting = if habit.is_wilting() { " wilting" } else { "" },
        frequency = habit.frequency,
        options = frequency_select(habit.frequency),
    )
}

fn frequency_select(selected: Frequency) -> String {
    let option = |frequency: Frequency| {
        let marker = if frequency == selected { " selected" } else { "" };
        format!(r#"<option value="{frequency}"{marker}>{frequency}</option>"#)
    };
    format!(
        r#"<select name="frequency">{}{}</select>"#,
        option(Frequency::Daily),
        option(Frequency::Weekly)
    )
}

pub fn render_login(flash: Option<&str>) -> String {
    page(
        "Log in",
        &LOGIN_HTML.replace("{{FLASH}}", &render_flash(flash)),
    )
}

pub fn render_signup(flash: Option<&str>) -> String {
    page(
        "Sign up",
        &SIGNUP_HTML.replace("{{FLASH}}", &render_flash(flash)),
    )
}

/// Steps of the forgotten-password flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStage {
    RequestOtp,
    EnterOtp,
    NewPassword,
}

pub fn render_forgot_password(
    stage: ResetStage,
    email: Option<&str>,
    flash: Option<&str>,
) -> String {
    let email = escape_html(email.unwrap_or_default());
    let form = match stage {
        ResetStage::RequestOtp => FORGOT_EMAIL_FORM.to_string(),
        ResetStage::EnterOtp => FORGOT_OTP_FORM.replace("{{EMAIL}}", &email),
        ResetStage::NewPassword => FORGOT_RESET_FORM.replace("{{EMAIL}}", &email),
    };
    page(
        "Reset password",
        &FORGOT_HTML
            .replace("{{FLASH}}", &render_flash(flash))
            .replace("{{FORM}}", &form),
    )
}

fn render_flash(flash: Option<&str>) -> String {
    flash
        .map(|message| format!(r#"<div class="flash">{}</div>"#, escape_html(message)))
        .unwrap_or_default()
}

fn render_reminder(slots: &[GridSlot]) -> String {
    wilting_reminder(slots)
        .map(|message| {
            format!(
                r#"<div class="reminder"><strong>&#x1F331; Plant Reminder</strong> {}</div>"#,
                escape_html(&message)
            )
        })
        .unwrap_or_default()
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn page(title: &str, body: &str) -> String {
    PAGE_HTML
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{BODY}}", body)
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    :root {
      --soil: #294936;
      --paper: #f7f3ed;
      --leaf: #5b8c5a;
      --wilt: #b08d57;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--paper);
      color: var(--soil);
      font-family: "Trebuchet MS", sans-serif;
    }

    nav {
      display: flex;
      justify-content: space-between;
      align-items: center;
      padding: 16px 28px;
      background: var(--soil);
      color: var(--paper);
    }

    main {
      width: min(960px, 100%);
      margin: 0 auto;
      padding: 28px 18px;
      display: grid;
      gap: 24px;
    }

    .card {
      background: white;
      border-radius: 18px;
      padding: 24px;
      box-shadow: 0 12px 30px rgba(41, 73, 54, 0.12);
      display: grid;
      gap: 12px;
    }

    .garden {
      display: grid;
      grid-template-columns: repeat(4, minmax(0, 1fr));
      gap: 16px;
    }

    .pot {
      background: white;
      border-radius: 16px;
      padding: 16px;
      text-align: center;
      display: grid;
      gap: 6px;
    }

    .pot.empty {
      opacity: 0.55;
    }

    .pot.wilting {
      border: 2px solid var(--wilt);
    }

    .plant {
      font-size: 2.6rem;
    }

    .name {
      margin: 0;
      font-weight: 600;
    }

    .frequency {
      margin: 0;
      font-size: 0.8rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
    }

    .summary {
      display: flex;
      gap: 18px;
      flex-wrap: wrap;
    }

    .flash, .reminder {
      padding: 12px 16px;
      border-radius: 12px;
      background: #fff3cd;
      border: 1px solid #ffc107;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 8px 14px;
      background: var(--soil);
      color: var(--paper);
      cursor: pointer;
    }

    button.droplet {
      background: #3b82c4;
    }

    button.shovel {
      background: transparent;
      color: var(--wilt);
    }

    input, select {
      padding: 8px 10px;
      border-radius: 10px;
      border: 1px solid rgba(41, 73, 54, 0.3);
    }

    @media (max-width: 700px) {
      .garden {
        grid-template-columns: repeat(2, minmax(0, 1fr));
      }
    }
  </style>
</head>
<body>
{{BODY}}
</body>
</html>
"#;

const GARDEN_HTML: &str = r#"<nav>
  <strong>Pot Your Progress</strong>
  <span>{{USER}}</span>
  <form method="post" action="/logout"><button type="submit">Log out</button></form>
</nav>
<main>
  {{FLASH}}
  {{REMINDER}}
  <section class="summary">
    <span>Planted: <strong id="occupied">{{OCCUPIED}}</strong>/8</span>
    <span>Needs water: <strong id="pending">{{PENDING}}</strong></span>
    <span>Watered: <strong id="done">{{DONE}}</strong></span>
    <span>Wilting: <strong id="wilting">{{WILTING}}</strong></span>
  </section>
  <section class="garden">
{{POTS}}
  </section>
  <section class="card">
    <h2>Add habit</h2>
    <form method="post" action="/habits">
      <input name="habit_name" placeholder="Enter habit name" required />
      <select name="frequency">
        <option value="daily" selected>daily</option>
        <option value="weekly">weekly</option>
      </select>
      <button type="submit">Plant</button>
    </form>
    <form method="post" action="/garden/clear">
      <button class="shovel" type="submit">Clear garden</button>
    </form>
  </section>
</main>"#;

const LOGIN_HTML: &str = r#"<main>
  <section class="card">
    <h1>Pot Your Progress</h1>
    {{FLASH}}
    <form method="post" action="/login">
      <label>Email <input name="email" type="email" required /></label>
      <label>Password <input name="password" type="password" required /></label>
      <button type="submit">Log in</button>
    </form>
    <a href="/signup">Create an account</a>
    <a href="/forgot-password">Forgot password?</a>
  </section>
</main>"#;

const SIGNUP_HTML: &str = r#"<main>
  <section class="card">
    <h1>Sign up</h1>
    {{FLASH}}
    <form method="post" action="/signup">
      <label>Name <input name="name" required /></label>
      <label>Email <input name="email" type="email" required /></label>
      <label>Password <input name="password" type="password" required /></label>
      <button type="submit">Sign up</button>
    </form>
    <a href="/login">Back to log in</a>
  </section>
</main>"#;

const FORGOT_HTML: &str = r#"<main>
  <section class="card">
    <h1>Reset password</h1>
    {{FLASH}}
    {{FORM}}
    <a href="/login">Back to log in</a>
  </section>
</main>"#;

const FORGOT_EMAIL_FORM: &str = r#"<form method="post" action="/forgot-password">
      <label>Email <input name="email" type="email" required /></label>
      <button type="submit">Send code</button>
    </form>"#;

const FORGOT_OTP_FORM: &str = r#"<form method="post" action="/verify-otp">
      <p>Enter the 6-digit code sent to {{EMAIL}}.</p>
      <input name="otp" inputmode="numeric" maxlength="6" required />
      <button type="submit">Verify</button>
    </form>"#;

const FORGOT_RESET_FORM: &str = r#"<form method="post" action="/reset-password">
      <p>Choose a new password for {{EMAIL}}.</p>
      <label>New password <input name="new_password" type="password" required /></label>
      <label>Confirm password <input name="confirm_password" type="password" required /></label>
      <button type="submit">Reset password</button>
    </form>"#;
