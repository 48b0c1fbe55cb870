//! 预订技能
//!
//! create / get / update / cancel reservations and today's summary.
//! Past times and times outside opening hours are rejected here; the
//! service only validates formats and ranges.

use chrono::{NaiveDate, Timelike};
use serde_json::{Value, json};
use shared::error::ErrorCode;
use shared::models::{
    PartyOrderInput, Reservation, ReservationCreate, ReservationDetail, ReservationQuery,
    ReservationUpdate,
};

use crate::core::ServerState;
use crate::services::receipts;
use crate::utils::phone::{extract_number, normalize_phone};
use crate::utils::time::{format_12h, format_spoken_date, is_in_past, parse_local, people, today};
use crate::utils::{AppError, AppResult};
use crate::voice::normalize::{parse_flexible_date, parse_flexible_time, split_iso};
use crate::voice::skills::{
    SkillResult, confirm_by_sms, describe_lines, parse_items, spoken_count,
};
use crate::voice::swaig::{Args, FunctionResult, SwaigRequest};

/// Shown to callers when several bookings match
const MAX_LISTED: usize = 5;

pub async fn create_reservation(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let name = args
        .str("name")
        .ok_or_else(|| AppError::validation("I need a name for the reservation."))?;
    let party_size = args
        .int("party_size")
        .ok_or_else(|| AppError::validation("How many people will be dining?"))?;
    let party_size = spoken_count(party_size, "party size")?;
    let (date, time) = requested_slot(args, today(state.config.timezone))?;
    let date = date.ok_or_else(|| AppError::validation("What date would you like to come in?"))?;
    let time = time.ok_or_else(|| AppError::validation("What time would you like the table?"))?;
    check_bookable(state, &date, &time)?;

    let phone = normalize_phone(
        args.str("phone_number").as_deref(),
        req.caller_phone().as_deref(),
    )
    .ok_or_else(|| {
        AppError::validation("I need a phone number for the reservation so we can text your confirmation.")
    })?;

    let detail = state
        .reservations
        .create(ReservationCreate {
            name: name.clone(),
            phone_number: phone.clone(),
            party_size,
            date,
            time,
            special_requests: args.str("special_requests"),
            meta_data: Some(json!({ "source": "phone", "call_id": req.call_id() })),
            party_orders: party_orders(args, &name)?,
        })
        .await?;

    let r = &detail.reservation;
    let mut response = format!(
        "Perfect! Your reservation for {} on {} at {} is confirmed under {}. \
         Your reservation number is {}.",
        people(r.party_size),
        format_spoken_date(&r.date),
        format_12h(&r.time),
        r.name,
        r.reservation_number,
    );
    if !detail.party_orders.is_empty() {
        let lines = describe_lines(
            detail
                .party_orders
                .iter()
                .flat_map(|o| o.items.iter())
                .map(|i| (i.menu_item_name.as_str(), i.quantity)),
        );
        response.push_str(&format!(
            " I've added your pre-order: {lines}. The total comes to ${:.2}.",
            detail.bill_total
        ));
    }
    response.push_str(" You'll receive a text confirmation shortly.");

    let body = receipts::reservation_confirmed(&state.config.restaurant_name, &detail);
    let result = FunctionResult::new(response).add_action("reservation_data", &detail);
    Ok(confirm_by_sms(state, result, &phone, &body).await)
}

pub async fn get_reservation(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let date = args
        .str("date")
        .and_then(|d| parse_flexible_date(&d, today(state.config.timezone)));

    let matches: Vec<Reservation> = if let Some(raw) = args.str("reservation_number") {
        let number = reservation_number(&raw)?;
        vec![state.reservations.find_by_number(&number).await?.reservation]
    } else if let Some(id) = args.int("reservation_id") {
        vec![state.reservations.get(id).await?.reservation]
    } else if let Some(name) = args.str("name") {
        let query = ReservationQuery {
            search: Some(name),
            date: date.clone(),
            status: None,
        };
        state.reservations.list(&query).await?
    } else if let Some(phone) = normalize_phone(
        args.str("phone_number").as_deref(),
        req.caller_phone().as_deref(),
    ) {
        let mut found = state.reservations.for_phone(&phone).await?;
        if let Some(d) = &date {
            found.retain(|r| &r.date == d);
        }
        found
    } else if let Some(d) = &date {
        state.reservations.for_date(d).await?
    } else {
        Vec::new()
    };

    if args.wants_json() {
        let data = json!({ "reservations": matches });
        return Ok(FunctionResult::new(data.to_string()).add_action("reservation_data", data));
    }

    match matches.as_slice() {
        [] => Ok(FunctionResult::new(
            "I couldn't find a reservation matching that. Could you give me your \
             reservation number or the name it's under?",
        )),
        [one] => {
            let detail = state.reservations.get(one.id).await?;
            Ok(FunctionResult::new(describe_detail(&detail)).add_action("reservation_data", &detail))
        }
        many => {
            let listed: Vec<String> = many.iter().take(MAX_LISTED).map(summary).collect();
            let response = format!(
                "I found {} reservations: {}. Which one are you asking about?",
                many.len(),
                listed.join("; ")
            );
            Ok(FunctionResult::new(response).add_action("reservation_data", json!({ "reservations": many })))
        }
    }
}

pub async fn update_reservation(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let current = locate(state, req, args).await?;
    let r = &current.reservation;

    let (date, time) = requested_slot(args, today(state.config.timezone))?;
    if date.is_some() || time.is_some() {
        check_bookable(
            state,
            date.as_deref().unwrap_or(&r.date),
            time.as_deref().unwrap_or(&r.time),
        )?;
    }
    let party_size = args
        .int("party_size")
        .map(|n| spoken_count(n, "party size"))
        .transpose()?;
    let update = ReservationUpdate {
        name: args.str("name"),
        party_size,
        date,
        time,
        special_requests: args.str("special_requests"),
        ..Default::default()
    };
    if update.is_empty() {
        return Err(AppError::validation(format!(
            "What would you like to change about reservation {}?",
            r.reservation_number
        )));
    }

    let updated = state.reservations.update(r.id, update).await?;
    let u = &updated.reservation;
    let response = format!(
        "All set. Reservation {} is now for {} on {} at {}. I'll text you the updated details.",
        u.reservation_number,
        people(u.party_size),
        format_spoken_date(&u.date),
        format_12h(&u.time),
    );
    let body = receipts::reservation_updated(&state.config.restaurant_name, u);
    let result = FunctionResult::new(response).add_action("reservation_data", &updated);
    Ok(confirm_by_sms(state, result, &u.phone_number, &body).await)
}

pub async fn cancel_reservation(state: &ServerState, req: &SwaigRequest, args: &Args) -> SkillResult {
    let current = locate(state, req, args).await?;
    let cancelled = state.reservations.cancel(current.reservation.id).await?;
    let r = &cancelled.reservation;
    let response = format!(
        "Your reservation {} for {} on {} at {} has been cancelled. \
         We hope to see you another time.",
        r.reservation_number,
        people(r.party_size),
        format_spoken_date(&r.date),
        format_12h(&r.time),
    );
    let body = receipts::reservation_cancelled(&state.config.restaurant_name, r);
    let result = FunctionResult::new(response).add_action("reservation_data", &cancelled);
    Ok(confirm_by_sms(state, result, &r.phone_number, &body).await)
}

pub async fn get_todays_reservations(state: &ServerState) -> SkillResult {
    let date = today(state.config.timezone).format("%Y-%m-%d").to_string();
    let bookings = state.reservations.for_date(&date).await?;
    if bookings.is_empty() {
        return Ok(FunctionResult::new("There are no reservations on the books for today."));
    }
    let guests: i32 = bookings.iter().map(|r| r.party_size).sum();
    let lines: Vec<String> = bookings
        .iter()
        .map(|r| format!("{} {}, party of {}", format_12h(&r.time), r.name, r.party_size))
        .collect();
    let response = format!(
        "We have {} reservations today for {} guests in total: {}.",
        bookings.len(),
        guests,
        lines.join("; ")
    );
    Ok(FunctionResult::new(response).add_action("reservation_data", json!({ "date": date, "reservations": bookings })))
}

/// Reservation by number, id, or the caller's upcoming booking
async fn locate(state: &ServerState, req: &SwaigRequest, args: &Args) -> AppResult<ReservationDetail> {
    if let Some(raw) = args.str("reservation_number") {
        return state.reservations.find_by_number(&reservation_number(&raw)?).await;
    }
    if let Some(id) = args.int("reservation_id") {
        return state.reservations.get(id).await;
    }
    if let Some(phone) = normalize_phone(
        args.str("phone_number").as_deref(),
        req.caller_phone().as_deref(),
    ) {
        let today = today(state.config.timezone).format("%Y-%m-%d").to_string();
        let found = state.reservations.for_phone(&phone).await?;
        let open: Vec<&Reservation> = found.iter().filter(|r| !r.is_cancelled()).collect();
        let pick = open
            .iter()
            .find(|r| r.date >= today)
            .or_else(|| open.first());
        if let Some(r) = pick {
            return state.reservations.get(r.id).await;
        }
    }
    Err(AppError::with_message(
        ErrorCode::ReservationNotFound,
        "I couldn't find a reservation for this call. Could you tell me your reservation number?",
    ))
}

fn reservation_number(raw: &str) -> AppResult<String> {
    extract_number(raw, 6).ok_or_else(|| {
        AppError::validation(format!(
            "Reservation numbers have six digits. I heard '{raw}'. Could you repeat it?"
        ))
    })
}

/// Date and time from `date` / `time`, accepting ISO datetimes in either field
fn requested_slot(args: &Args, today: NaiveDate) -> AppResult<(Option<String>, Option<String>)> {
    let raw_date = args.str("date");
    let raw_time = args.str("time");

    for raw in [&raw_time, &raw_date].into_iter().flatten() {
        if let Some((d, t)) = split_iso(raw) {
            return Ok((Some(d), Some(t)));
        }
    }

    let date = match raw_date {
        Some(raw) => Some(parse_flexible_date(&raw, today).ok_or_else(|| {
            AppError::validation(format!("I didn't catch the date '{raw}'. Could you say it again?"))
        })?),
        None => None,
    };
    let time = match raw_time {
        Some(raw) => Some(parse_flexible_time(&raw).ok_or_else(|| {
            AppError::validation(format!("I didn't catch the time '{raw}'. Could you say it again?"))
        })?),
        None => None,
    };
    Ok((date, time))
}

/// Reject slots in the past or outside opening hours
fn check_bookable(state: &ServerState, date: &str, time: &str) -> AppResult<()> {
    let at = parse_local(date, time)?;
    if is_in_past(at, state.config.timezone) {
        return Err(AppError::with_message(
            ErrorCode::ReservationInPast,
            format!(
                "{} at {} has already passed. Please choose a future date and time.",
                format_spoken_date(date),
                format_12h(time)
            ),
        ));
    }
    if !state.config.is_open_at(at.hour()) {
        return Err(AppError::with_message(
            ErrorCode::ReservationOutsideHours,
            format!(
                "We take reservations between {} and {}.",
                format_12h(&format!("{:02}:00", state.config.opening_hour)),
                format_12h(&format!("{:02}:00", state.config.closing_hour)),
            ),
        ));
    }
    Ok(())
}

/// `party_orders` plus a flat `pre_order` list credited to the guest
fn party_orders(args: &Args, guest_name: &str) -> AppResult<Vec<PartyOrderInput>> {
    let mut orders = Vec::new();
    for p in args.array("party_orders") {
        let Some(obj) = p.as_object() else { continue };
        let items = parse_items(
            obj.get("items")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        )?;
        if items.is_empty() {
            continue;
        }
        let person_name = obj
            .get("person_name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(guest_name)
            .to_string();
        orders.push(PartyOrderInput { person_name, items });
    }

    let pre_order = parse_items(&args.array("pre_order"))?;
    if !pre_order.is_empty() {
        orders.push(PartyOrderInput {
            person_name: guest_name.to_string(),
            items: pre_order,
        });
    }
    Ok(orders)
}

fn summary(r: &Reservation) -> String {
    let status = if r.is_cancelled() { " (cancelled)" } else { "" };
    format!(
        "number {} for {}, {} on {} at {}{status}",
        r.reservation_number,
        r.name,
        people(r.party_size),
        format_spoken_date(&r.date),
        format_12h(&r.time),
    )
}

fn describe_detail(detail: &ReservationDetail) -> String {
    let r = &detail.reservation;
    let mut text = format!("I found reservation {}.", summary(r));
    if !detail.party_orders.is_empty() {
        text.push_str(&format!(" The pre-order total is ${:.2}", detail.bill_total));
        text.push_str(if r.is_paid() {
            " and it has been paid."
        } else {
            " and it hasn't been paid yet."
        });
    }
    if let Some(req) = r.special_requests.as_deref() {
        text.push_str(&format!(" Special requests: {req}."));
    }
    text
}
