use roster_types::*;

const PLACEHOLDER: &str = "—";

pub fn format_list_result(result: &ListUsersResult) -> String {
    let footer = format!(
        "{} of {} users, sorted by {}",
        result.users.len(),
        result.total,
        result.sort.label().to_lowercase()
    );

    if result.users.is_empty() {
        let message = if result.query.trim().is_empty() {
            "No users".to_string()
        } else {
            format!("No users match \"{}\"", result.query.trim())
        };
        return format!("{}\n\n{}", message, footer);
    }

    let header = ["ID", "NAME", "EMAIL", "COMPANY"];
    let rows: Vec<[&str; 4]> = result
        .users
        .iter()
        .map(|u| [u.id.as_str(), u.name.as_str(), u.email.as_str(), u.company.as_str()])
        .collect();

    let mut widths = header.map(display_width);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(display_width(cell));
        }
    }

    let mut lines = vec![format_row(&header, &widths)];
    lines.extend(rows.iter().map(|row| format_row(row, &widths)));
    lines.push(String::new());
    lines.push(footer);
    lines.join("\n")
}

fn display_width(s: &str) -> usize {
    s.chars().count()
}

fn format_row(cells: &[&str; 4], widths: &[usize; 4]) -> String {
    let mut out = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths.iter()).enumerate() {
        out.push_str(cell);
        if i + 1 < cells.len() {
            let pad = width - display_width(cell) + 2;
            out.push_str(&" ".repeat(pad));
        }
    }
    out
}

pub fn format_address(address: Option<&Address>) -> String {
    match address {
        Some(a) => format!("{}, {}, {} ({})", a.street, a.suite, a.city, a.zipcode),
        None => PLACEHOLDER.to_string(),
    }
}

fn or_placeholder(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(PLACEHOLDER)
}

pub fn format_user_detail(user: &UserRecord) -> String {
    let website = match user.website.as_deref().filter(|w| !w.trim().is_empty()) {
        Some(w) => format!("{} (http://{})", w, w),
        None => PLACEHOLDER.to_string(),
    };

    [
        user.name.clone(),
        format!("ID: {}", user.id),
        String::new(),
        format!("Email:   {}", or_placeholder(Some(&user.email))),
        format!("Phone:   {}", or_placeholder(user.phone.as_deref())),
        format!("Website: {}", website),
        format!("Company: {}", or_placeholder(Some(&user.company))),
        format!("Address: {}", format_address(user.address.as_ref())),
    ]
    .join("\n")
}

pub fn format_show_result(result: &ShowUserResult) -> String {
    match &result.user {
        Some(user) => format_user_detail(user),
        None => "User not found.".to_string(),
    }
}

pub fn format_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("  {}: {}", field, message))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_user_line(user: &UserRecord) -> String {
    format!("{} {} <{}> ({})", user.id, user.name, user.email, user.company)
}

pub fn format_add_result(result: &AddUserResult) -> String {
    if !result.errors.is_empty() {
        return format!("User not added:\n{}", format_field_errors(&result.errors));
    }
    match &result.user {
        Some(user) => format!("Added user:\n  {}", format_user_line(user)),
        None => "User not added".to_string(),
    }
}

pub fn format_edit_result(result: &EditUserResult) -> String {
    if !result.found {
        return format!("User not found: {}", result.id);
    }
    if !result.errors.is_empty() {
        return format!("User not updated:\n{}", format_field_errors(&result.errors));
    }
    match &result.user {
        Some(user) => format!("Updated user:\n  {}", format_user_line(user)),
        None => format!("User not found: {}", result.id),
    }
}

pub fn format_delete_result(result: &DeleteUserResult) -> String {
    match &result.removed {
        Some(user) => format!("Deleted user:\n  {}", format_user_line(user)),
        None => format!("No user with id {}", result.id),
    }
}

pub fn format_reload_result(result: &ReloadUsersResult) -> String {
    if result.discarded {
        "Reload superseded by a newer load; result discarded".to_string()
    } else {
        format!("Loaded {} users", result.loaded)
    }
}

pub fn format_describe_session_result(result: &DescribeSessionResult) -> String {
    let state = if result.loaded {
        format!("{} users", result.user_count)
    } else {
        "not loaded yet".to_string()
    };
    [
        format!("Daemon PID: {}", result.daemon_pid),
        format!("API: {}", result.api_base_url),
        format!("Store: {}", state),
        format!("Default sort: {}", result.default_sort.label()),
    ]
    .join("\n")
}
