use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};

use crate::app::{self, App, Screen};

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // title bar
            Constraint::Min(10),    // main content
            Constraint::Length(3),  // action bar
            Constraint::Length(6),  // message log
        ])
        .split(frame.area());

    draw_title_bar(frame, app, chunks[0]);

    match app.screen {
        Screen::Dashboard => draw_dashboard(frame, app, chunks[1]),
        Screen::Confirm => draw_confirm(frame, app, chunks[1]),
        Screen::Result => draw_result(frame, app, chunks[1]),
    }

    draw_action_bar(frame, app, chunks[2]);
    draw_message_log(frame, app, chunks[3]);
}

fn draw_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let wallet = app
        .session
        .wallet_address()
        .map(|w| app::short_pubkey(&w))
        .unwrap_or_else(|| "no wallet".into());
    let refresh_str = app
        .last_refresh
        .map(|t| format!("{}s ago", t.elapsed().as_secs()))
        .unwrap_or_else(|| "never".into());
    let busy = app.busy.map(|b| format!(" | {}...", b)).unwrap_or_default();

    let title = format!(
        " Candy Mint | {} | {} | Group: {} | Last refresh: {}{} ",
        wallet,
        app.session.config().cluster,
        app.session.config().group_label,
        refresh_str,
        busy,
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(block, area);
}

fn draw_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // sale panel
            Constraint::Min(5),    // items
        ])
        .split(area);

    draw_sale_panel(frame, app, chunks[0]);
    draw_items_panel(frame, app, chunks[1]);
}

fn label(text: &str) -> Span<'_> {
    Span::styled(text, Style::default().fg(Color::Gray))
}

fn draw_sale_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Sale ")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let snapshot = match app.session.snapshot() {
        Some(s) => s,
        None => {
            let text = match &app.load_error {
                Some(err) => Paragraph::new(format!("  {}", err))
                    .style(Style::default().fg(Color::Red))
                    .wrap(Wrap { trim: false }),
                None => Paragraph::new("  Loading sale configuration..."),
            };
            frame.render_widget(text, inner);
            return;
        }
    };
    let config = &snapshot.config;
    let decision = app.decision();

    let remaining_color = if config.remaining_items() == 0 { Color::Red } else { Color::Green };
    let mut lines = vec![
        Line::from(vec![
            label("  Candy Machine: "),
            Span::raw(app::short_pubkey(&config.candy_machine)),
            Span::raw("    "),
            label("Guard: "),
            Span::raw(
                config
                    .candy_guard
                    .map(|g| app::short_pubkey(&g))
                    .unwrap_or_else(|| "none".into()),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            label("  Minted: "),
            Span::raw(format!("{} / {}", config.redeemed_items, config.total_items)),
            Span::raw("    "),
            label("Remaining: "),
            Span::styled(config.remaining_items().to_string(), Style::default().fg(remaining_color)),
            Span::raw("    "),
            label("Price: "),
            Span::styled(
                format!("{} SOL", app::lamports_to_sol(config.price_lamports())),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    let balance = app
        .session
        .identity()
        .map(|i| format!("{} SOL", app::lamports_to_sol(i.lamports)))
        .unwrap_or_else(|| "-".into());
    lines.push(Line::from(vec![label("  Wallet balance: "), Span::raw(balance)]));

    if let Some(d) = &decision {
        let mut rules = Vec::new();
        if let Some((mint, amount)) = d.token_gate {
            let held = app
                .token_gate_balance
                .map(|b| format!(", holding {}", b))
                .unwrap_or_default();
            rules.push(format!("hold {} of {}{}", amount, app::short_pubkey(&mint), held));
        }
        if let Some((mint, amount, _)) = d.token_payment {
            rules.push(format!("pay {} of {}", amount, app::short_pubkey(&mint)));
        }
        if !rules.is_empty() {
            lines.push(Line::from(vec![label("  Requires: "), Span::raw(rules.join("; "))]));
        }
    }

    let status = match app.blocking_message() {
        Some(msg) => Span::styled(format!("  {}", msg), Style::default().fg(Color::Red)),
        None => Span::styled(
            "  Ready to mint. Press [m].",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    };
    lines.push(Line::from(""));
    lines.push(Line::from(status));

    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn draw_items_panel(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.session.snapshot();
    let items = snapshot.as_ref().map(|s| s.items.as_slice()).unwrap_or(&[]);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Items ({}) ", items.len()))
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if items.is_empty() {
        frame.render_widget(Paragraph::new("  No displayable items."), inner);
        return;
    }

    let header = Row::new(vec!["", "#", "Name", "Image"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    // Keep the cursor in view.
    let visible = inner.height.saturating_sub(1) as usize;
    let start = app.item_cursor.saturating_sub(visible.saturating_sub(1));

    let rows: Vec<Row> = items
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(i, item)| {
            let selected = i == app.item_cursor;
            let style = if selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(if selected { ">" } else { " " }),
                Cell::from(item.index.to_string()),
                Cell::from(item.name.clone()),
                Cell::from(item.image.clone()),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Length(6),
            Constraint::Length(28),
            Constraint::Min(10),
        ],
    )
    .header(header);
    frame.render_widget(table, inner);
}

fn draw_confirm(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Confirm Mint ")
        .border_style(Style::default().fg(Color::Red));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = vec![Line::from("")];
    if let Some(snapshot) = app.session.snapshot() {
        let config = &snapshot.config;
        lines.push(Line::from(format!(
            "  Mint 1 item from {} (group {})",
            app::short_pubkey(&config.candy_machine),
            app.session.config().group_label
        )));
        lines.push(Line::from(format!(
            "  Price: {} SOL",
            app::lamports_to_sol(config.price_lamports())
        )));
        if let Some((mint, amount, _)) = config.token_payment() {
            lines.push(Line::from(format!(
                "  Token payment: {} of {}",
                amount,
                app::short_pubkey(&mint)
            )));
        }
        if let Some(bot_tax) = config.bot_tax_lamports {
            lines.push(Line::from(format!(
                "  Bot tax on failure: {} SOL",
                app::lamports_to_sol(bot_tax)
            )));
        }
        lines.push(Line::from(format!(
            "  Remaining: {}",
            config.remaining_items()
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press [Y] to confirm and send, [N] or [Esc] to cancel",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )));

    frame.render_widget(Paragraph::new(Text::from(lines)), inner);
}

fn draw_result(frame: &mut Frame, app: &App, area: Rect) {
    let (title, color) = match &app.last_outcome {
        Some(Ok(_)) => (" Mint Result ", Color::Green),
        _ => (" Mint Failed ", Color::Red),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = vec![Line::from("")];
    match &app.last_outcome {
        Some(Ok(result)) => {
            lines.push(Line::from(vec![
                label("  Minted: "),
                Span::styled(result.name.clone(), Style::default().fg(Color::Green)),
            ]));
            lines.push(Line::from(vec![label("  Asset: "), Span::raw(result.minted_asset_id.to_string())]));
            lines.push(Line::from(vec![label("  Image: "), Span::raw(result.image.clone())]));
            lines.push(Line::from(vec![label("  Metadata: "), Span::raw(result.metadata_uri.clone())]));
            lines.push(Line::from(vec![label("  Signature: "), Span::raw(result.signature.to_string())]));
        }
        Some(Err(msg)) => {
            lines.push(Line::from(Span::styled(
                format!("  {}", msg),
                Style::default().fg(Color::Red),
            )));
        }
        None => {}
    }

    frame.render_widget(Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }), inner);
}

fn draw_action_bar(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Actions ")
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let line = match app.screen {
        Screen::Confirm => Line::from(vec![
            action_key("[Y]"), action_label("Confirm  "),
            action_key("[N]"), action_label("Cancel"),
        ]),
        Screen::Result => Line::from(vec![action_label("Press any key to continue")]),
        Screen::Dashboard => {
            let mut spans = Vec::new();
            if app.can_mint() {
                spans.extend([action_key("[m]"), action_label("int  ")]);
            } else {
                spans.push(Span::styled("[m]int  ", Style::default().fg(Color::DarkGray)));
            }
            spans.extend([action_key("[j/k]"), action_label("scroll  ")]);
            spans.extend([action_key("[r]"), action_label("efresh  ")]);
            spans.extend([action_key("[q]"), action_label("uit")]);
            Line::from(spans)
        }
    };

    frame.render_widget(Paragraph::new(line), inner);
}

fn action_key(key: &str) -> Span<'_> {
    Span::styled(key, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
}

fn action_label(label: &str) -> Span<'_> {
    Span::styled(label, Style::default().fg(Color::White))
}

fn draw_message_log(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Log ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = app
        .message_log
        .iter()
        .map(|m| Line::from(format!(" > {}", m)))
        .collect();

    // Wrapped rows, so the newest line stays visible.
    let width = inner.width as usize;
    let total_rows: usize = lines
        .iter()
        .map(|line| {
            let len = line.width();
            if width == 0 { 1 } else { 1_usize.max(len.div_ceil(width)) }
        })
        .sum();

    let scroll = (total_rows as u16).saturating_sub(inner.height);

    let para = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    frame.render_widget(para, inner);
}
