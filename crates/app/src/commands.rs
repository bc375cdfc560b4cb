use std::io::Write;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use datastore::{Cache, DataStore, LedgerApi, RefreshOutcome};
use engine::{
    Bill, BillDraft, BillListState, ShopDraft, ShopListQuery, Snapshot,
    listing::{AmountRange, DateFilter},
};

use crate::{
    config::{
        AddBillArgs, AddShopArgs, BillsArgs, Command, SetStatusArgs, ShopsArgs, SuggestArgs,
    },
    display::{bill_time, rupees},
    error::{AppError, Result},
};

const DASHBOARD_TOP_SHOPS: usize = 5;

/// Per-invocation settings the commands read.
#[derive(Clone, Copy, Debug)]
pub struct Context {
    pub tz: Tz,
    pub batch_size: usize,
    pub offline: bool,
    pub now: DateTime<Utc>,
}

pub async fn run<A, C, W>(
    store: &DataStore<A, C>,
    ctx: &Context,
    command: Command,
    out: &mut W,
) -> Result<()>
where
    A: LedgerApi,
    C: Cache,
    W: Write,
{
    if ctx.offline {
        if is_write(&command) {
            return Err(AppError::Usage(
                "cannot change the ledger while offline".to_string(),
            ));
        }
    } else if !matches!(command, Command::Refresh) {
        store.refresh().await;
    }

    let snapshot = store.snapshot().await;
    match command {
        Command::Dashboard => dashboard(&snapshot, out),
        Command::Shops(args) => shops(&snapshot, args, out),
        Command::Bills(args) => bills(&snapshot, ctx, args, out),
        Command::Suggest(args) => suggest(&snapshot, args, out),
        Command::AddShop(args) => add_shop(store, ctx, args, out).await,
        Command::DeleteShop(args) => {
            store.delete_shop(&args.id).await?;
            writeln!(out, "deleted shop: {}", args.id)?;
            Ok(())
        }
        Command::AddBill(args) => add_bill(store, ctx, args, out).await,
        Command::SetStatus(args) => set_status(store, ctx, args, out).await,
        Command::DeleteBill(args) => {
            store.delete_bill(&args.id).await?;
            writeln!(out, "deleted bill: {}", args.id)?;
            Ok(())
        }
        Command::Refresh => {
            if ctx.offline {
                return Err(AppError::Usage("refresh needs the API".to_string()));
            }
            let outcome = store.refresh().await;
            let refreshed = store.snapshot().await;
            match outcome {
                RefreshOutcome::Applied => writeln!(
                    out,
                    "refreshed: {} shops, {} bills",
                    refreshed.shops.len(),
                    refreshed.bills.len()
                )?,
                RefreshOutcome::Discarded => writeln!(out, "refresh superseded by a newer one")?,
            }
            Ok(())
        }
    }
}

fn is_write(command: &Command) -> bool {
    matches!(
        command,
        Command::AddShop(_)
            | Command::DeleteShop(_)
            | Command::AddBill(_)
            | Command::SetStatus(_)
            | Command::DeleteBill(_)
    )
}

fn dashboard(snapshot: &Snapshot, out: &mut impl Write) -> Result<()> {
    let stats = snapshot.dashboard();
    writeln!(out, "Shops:          {}", stats.total_shops)?;
    writeln!(out, "Pending bills:  {}", stats.total_pending_bills)?;
    writeln!(out, "To collect:     {}", rupees(stats.total_amount_to_collect, 2))?;

    let top = ShopListQuery::default().apply(&snapshot.shop_stats());
    if !top.is_empty() {
        writeln!(out)?;
    }
    for stat in top.iter().take(DASHBOARD_TOP_SHOPS) {
        writeln!(
            out,
            "  {:<24} {:>14}  ({} pending)",
            stat.shop.name,
            rupees(stat.total_pending, 0),
            stat.pending_count
        )?;
    }
    Ok(())
}

fn shops(snapshot: &Snapshot, args: ShopsArgs, out: &mut impl Write) -> Result<()> {
    let query = ShopListQuery {
        search: args.search,
        status: args.status.into(),
        sort: args.sort.into(),
    };
    let listed = query.apply(&snapshot.shop_stats());

    for stat in &listed {
        writeln!(
            out,
            "{:<38} {:<24} pending {:>12} ({})  received {:>12}",
            stat.shop.id,
            stat.shop.name,
            rupees(stat.total_pending, 0),
            stat.pending_count,
            rupees(stat.total_received, 0)
        )?;
    }
    if listed.is_empty() {
        writeln!(out, "no shops")?;
    }
    let active = query.active_filter_count();
    if active > 0 {
        writeln!(out, "{active} filter(s) active")?;
    }
    Ok(())
}

fn bills(snapshot: &Snapshot, ctx: &Context, args: BillsArgs, out: &mut impl Write) -> Result<()> {
    let shop = snapshot
        .shop(&args.shop_id)
        .ok_or_else(|| AppError::Usage(format!("shop not found: {}", args.shop_id)))?;

    let mut state = BillListState::new(ctx.tz, ctx.batch_size);
    state.set_status(args.status.into());
    state.set_amount(AmountRange::parse(&args.min, &args.max));
    state.set_date(match args.last {
        Some(days) => DateFilter::LastDays(days),
        None => DateFilter::parse_range(&args.from, &args.to),
    });
    state.set_sort(args.sort.into());

    let total = state.processed(&snapshot.bills, &shop.id, ctx.now).len();
    for _ in 1..args.pages {
        if !state.reveal_more(total) {
            break;
        }
    }
    let page = state.view(&snapshot.bills, &shop.id, ctx.now);

    if let Some(stat) = snapshot.shop_stats().iter().find(|s| s.shop.id == shop.id) {
        writeln!(
            out,
            "{}  pending {}  received {}",
            shop.name,
            rupees(stat.total_pending, 0),
            rupees(stat.total_received, 0)
        )?;
    }
    for bill in &page.bills {
        write_bill(bill, ctx.tz, out)?;
    }
    writeln!(out, "showing {} of {}", page.bills.len(), page.total)?;
    if page.has_more {
        writeln!(out, "more available: --pages {}", args.pages.max(1) + 1)?;
    }
    let active = state.active_filter_count();
    if active > 0 {
        writeln!(out, "{active} filter(s) active")?;
    }
    Ok(())
}

fn write_bill(bill: &Bill, tz: Tz, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "{:<9} {:>12}  {}  {}",
        bill.status.as_str(),
        rupees(bill.amount, 0),
        bill_time(bill.created_at, tz),
        bill.id
    )?;
    if bill.is_legacy() {
        writeln!(out, "    (no item breakdown)")?;
    }
    for item in bill.items() {
        writeln!(
            out,
            "    {} x {} @ {} = {}",
            item.quantity,
            item.name,
            rupees(item.price, 0),
            rupees(item.line_total(), 0)
        )?;
    }
    Ok(())
}

fn suggest(snapshot: &Snapshot, args: SuggestArgs, out: &mut impl Write) -> Result<()> {
    for name in snapshot.item_index().search(&args.prefix, args.limit) {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

async fn add_shop<A: LedgerApi, C: Cache>(
    store: &DataStore<A, C>,
    ctx: &Context,
    args: AddShopArgs,
    out: &mut impl Write,
) -> Result<()> {
    let shop = ShopDraft::new(&args.name).finish(ctx.now)?;
    store.save_shop(&shop).await?;
    writeln!(out, "created shop: {} ({})", shop.name, shop.id)?;
    Ok(())
}

async fn add_bill<A: LedgerApi, C: Cache>(
    store: &DataStore<A, C>,
    ctx: &Context,
    args: AddBillArgs,
    out: &mut impl Write,
) -> Result<()> {
    if store.snapshot().await.shop(&args.shop_id).is_none() {
        return Err(AppError::Usage(format!("shop not found: {}", args.shop_id)));
    }

    let mut draft = BillDraft::new(&args.shop_id);
    draft.items.clear();
    for item in args.items {
        let id = draft.add_item();
        let line = draft.item_mut(&id)?;
        line.name = item.name;
        line.quantity = item.quantity;
        line.price = item.price;
    }
    draft.status = args.status;

    let bill = draft.finish(ctx.now)?;
    store.save_bill(&bill).await?;
    writeln!(out, "created bill: {} for {}", bill.id, rupees(bill.amount, 0))?;
    Ok(())
}

async fn set_status<A: LedgerApi, C: Cache>(
    store: &DataStore<A, C>,
    ctx: &Context,
    args: SetStatusArgs,
    out: &mut impl Write,
) -> Result<()> {
    let snapshot = store.snapshot().await;
    let bill = snapshot
        .bill(&args.bill_id)
        .ok_or_else(|| AppError::Usage(format!("bill not found: {}", args.bill_id)))?;

    let mut draft = BillDraft::edit(bill);
    draft.status = args.status;
    let bill = draft.finish(ctx.now)?;
    store.save_bill(&bill).await?;
    writeln!(out, "bill {} is now {}", bill.id, bill.status)?;
    Ok(())
}
