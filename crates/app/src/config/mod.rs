use chrono_tz::Tz;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use datastore::{RefreshPolicy, default_cache_path};
use engine::{
    BillSort, BillStatus,
    item_index::DEFAULT_SUGGESTIONS,
    listing::{DEFAULT_BATCH_SIZE, StatusFilter},
    stats::{ShopSort, ShopStatusFilter},
};
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/kanakku.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_url: String,
    pub user_id: String,
    pub cache_path: String,
    pub timezone: String,
    pub batch_size: usize,
    pub refresh_policy: RefreshPolicy,
    pub request_timeout_secs: u64,
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/exec".to_string(),
            user_id: String::new(),
            cache_path: default_cache_path().to_string(),
            timezone: "Asia/Kolkata".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            refresh_policy: RefreshPolicy::default(),
            request_timeout_secs: 30,
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| AppError::Usage(format!("unknown timezone: {}", self.timezone)))
    }
}

#[derive(Debug, Parser)]
#[command(name = "kanakku", about = "Credit ledger for the shops you sell to")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the ledger API endpoint.
    #[arg(long)]
    api_url: Option<String>,
    /// Override the user whose ledger is read.
    #[arg(long)]
    user_id: Option<String>,
    /// Override timezone (IANA name).
    #[arg(long)]
    timezone: Option<String>,
    #[arg(long, value_parser = parse_policy)]
    refresh_policy: Option<RefreshPolicy>,
    /// Work from the local cache without contacting the API.
    #[arg(long, global = true)]
    offline: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Headline totals and the shops owing the most.
    Dashboard,
    /// List shops with their pending and received totals.
    Shops(ShopsArgs),
    /// List the bills of one shop.
    Bills(BillsArgs),
    /// Autocomplete an item name.
    Suggest(SuggestArgs),
    AddShop(AddShopArgs),
    DeleteShop(IdArgs),
    AddBill(AddBillArgs),
    /// Change the payment status of a bill.
    SetStatus(SetStatusArgs),
    DeleteBill(IdArgs),
    /// Fetch everything again and update the local cache.
    Refresh,
}

#[derive(ClapArgs, Debug)]
pub struct ShopsArgs {
    /// Case-insensitive substring of the shop name.
    #[arg(long, default_value = "")]
    pub search: String,
    #[arg(long, value_enum, default_value_t = ShopStatusArg::All)]
    pub status: ShopStatusArg,
    #[arg(long, value_enum, default_value_t = ShopSortArg::AmountDesc)]
    pub sort: ShopSortArg,
}

#[derive(ClapArgs, Debug)]
pub struct BillsArgs {
    pub shop_id: String,
    #[arg(long, value_enum, default_value_t = BillStatusArg::All)]
    pub status: BillStatusArg,
    #[arg(long, default_value = "")]
    pub min: String,
    #[arg(long, default_value = "")]
    pub max: String,
    /// Only bills from the last N days.
    #[arg(long, conflicts_with_all = ["from", "to"], value_parser = clap::value_parser!(u32).range(1..))]
    pub last: Option<u32>,
    /// First day included (YYYY-MM-DD).
    #[arg(long, default_value = "")]
    pub from: String,
    /// Last day included (YYYY-MM-DD).
    #[arg(long, default_value = "")]
    pub to: String,
    #[arg(long, value_enum, default_value_t = BillSortArg::StatusFirst)]
    pub sort: BillSortArg,
    /// Number of batches to show.
    #[arg(long, default_value_t = 1)]
    pub pages: usize,
}

#[derive(ClapArgs, Debug)]
pub struct SuggestArgs {
    pub prefix: String,
    #[arg(long, default_value_t = DEFAULT_SUGGESTIONS)]
    pub limit: usize,
}

#[derive(ClapArgs, Debug)]
pub struct AddShopArgs {
    pub name: String,
}

#[derive(ClapArgs, Debug)]
pub struct IdArgs {
    pub id: String,
}

#[derive(ClapArgs, Debug)]
pub struct AddBillArgs {
    pub shop_id: String,
    /// One line as `name:quantity:price`, repeatable.
    #[arg(long = "item", required = true, value_parser = parse_item)]
    pub items: Vec<ItemArg>,
    #[arg(long, value_parser = parse_status, default_value = "NOT_PAID")]
    pub status: BillStatus,
}

#[derive(ClapArgs, Debug)]
pub struct SetStatusArgs {
    pub bill_id: String,
    #[arg(value_parser = parse_status)]
    pub status: BillStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ItemArg {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ShopStatusArg {
    All,
    Pending,
    Clear,
}

impl From<ShopStatusArg> for ShopStatusFilter {
    fn from(value: ShopStatusArg) -> Self {
        match value {
            ShopStatusArg::All => Self::All,
            ShopStatusArg::Pending => Self::Pending,
            ShopStatusArg::Clear => Self::Clear,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ShopSortArg {
    NameAsc,
    NameDesc,
    AmountDesc,
    AmountAsc,
    ReceivedDesc,
    DateDesc,
}

impl From<ShopSortArg> for ShopSort {
    fn from(value: ShopSortArg) -> Self {
        match value {
            ShopSortArg::NameAsc => Self::NameAsc,
            ShopSortArg::NameDesc => Self::NameDesc,
            ShopSortArg::AmountDesc => Self::AmountDesc,
            ShopSortArg::AmountAsc => Self::AmountAsc,
            ShopSortArg::ReceivedDesc => Self::ReceivedDesc,
            ShopSortArg::DateDesc => Self::DateDesc,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BillStatusArg {
    All,
    NotPaid,
    Paid,
    Canceled,
}

impl From<BillStatusArg> for StatusFilter {
    fn from(value: BillStatusArg) -> Self {
        match value {
            BillStatusArg::All => Self::All,
            BillStatusArg::NotPaid => Self::Only(BillStatus::NotPaid),
            BillStatusArg::Paid => Self::Only(BillStatus::Paid),
            BillStatusArg::Canceled => Self::Only(BillStatus::Canceled),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BillSortArg {
    StatusFirst,
    DateDesc,
    DateAsc,
    AmountDesc,
    AmountAsc,
}

impl From<BillSortArg> for BillSort {
    fn from(value: BillSortArg) -> Self {
        match value {
            BillSortArg::StatusFirst => Self::StatusFirst,
            BillSortArg::DateDesc => Self::DateDesc,
            BillSortArg::DateAsc => Self::DateAsc,
            BillSortArg::AmountDesc => Self::AmountDesc,
            BillSortArg::AmountAsc => Self::AmountAsc,
        }
    }
}

fn parse_policy(raw: &str) -> std::result::Result<RefreshPolicy, String> {
    RefreshPolicy::try_from(raw)
}

fn parse_status(raw: &str) -> std::result::Result<BillStatus, String> {
    BillStatus::try_from(raw.replace('-', "_").as_str()).map_err(|err| err.to_string())
}

/// Parses `name:quantity:price`. The name may itself contain `:`.
fn parse_item(raw: &str) -> std::result::Result<ItemArg, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(price), Some(quantity), Some(name)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected name:quantity:price, got {raw:?}"));
    };

    let name = name.trim();
    if name.is_empty() {
        return Err("item name must not be empty".to_string());
    }
    let quantity = engine::listing::parse_amount(quantity)
        .filter(|quantity| *quantity > 0.0)
        .ok_or_else(|| format!("invalid quantity: {quantity:?}"))?;
    let price = engine::listing::parse_amount(price)
        .filter(|price| *price >= 0.0)
        .ok_or_else(|| format!("invalid price: {price:?}"))?;

    Ok(ItemArg {
        name: name.to_string(),
        quantity,
        price,
    })
}

/// Everything `main` needs: the merged settings and what to do.
#[derive(Debug)]
pub struct Invocation {
    pub config: AppConfig,
    pub command: Command,
    pub offline: bool,
}

pub fn load() -> Result<Invocation> {
    let args = Args::parse();

    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("KANAKKU"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    if let Some(user_id) = args.user_id {
        settings.user_id = user_id;
    }
    if let Some(timezone) = args.timezone {
        settings.timezone = timezone;
    }
    if let Some(policy) = args.refresh_policy {
        settings.refresh_policy = policy;
    }

    Ok(Invocation {
        config: settings,
        command: args.command,
        offline: args.offline,
    })
}
