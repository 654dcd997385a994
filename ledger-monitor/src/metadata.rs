//! Currency and token display metadata.
//!
//! Static lookup from a currency/token code to its display name, country label and
//! icon reference. Lookup never fails: unknown codes resolve to a generic "Global"
//! descriptor carrying the requested code.

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::sync::LazyLock;

/// Icon used for native platform tokens and for every unknown code.
pub const GLOBE_ICON: &str = "/static/images/flags/globe.svg";

/// Icon shared by all cryptocurrencies.
pub const CRYPTO_ICON: &str = "/static/images/flags/crypto.svg";

/// Country label used for unknown codes and cryptocurrencies.
pub const GLOBAL_COUNTRY: &str = "Global";

/// Display attributes of a currency or token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CurrencyDescriptor {
    pub code: SmolStr,
    pub display_name: String,
    pub country_label: String,
    pub icon_ref: String,
}

impl CurrencyDescriptor {
    /// Generic descriptor for a code missing from the table.
    pub fn global(code: &str) -> Self {
        Self {
            code: SmolStr::new(code),
            display_name: code.to_string(),
            country_label: GLOBAL_COUNTRY.to_string(),
            icon_ref: GLOBE_ICON.to_string(),
        }
    }

    /// Single-line label used in selectors and conversion results, eg/ "USD - US Dollar".
    pub fn option_label(&self) -> String {
        format!("{} - {}", self.code, self.display_name)
    }
}

// (code, icon, name, country)
const TABLE: &[(&str, &str, &str, &str)] = &[
    // Native platform tokens
    ("NVCT", GLOBE_ICON, "NVC Token", "NVC"),
    ("SPU", GLOBE_ICON, "Special Purpose Unit", "NVC"),
    ("TU", GLOBE_ICON, "Treasury Unit", "NVC"),
    ("AFD1", GLOBE_ICON, "American Federation Dollar", "AFD"),
    ("SFN", GLOBE_ICON, "Swifin Coin", "SFN"),
    ("AKLUMI", GLOBE_ICON, "Ak Lumi", "ECO-6"),
    // Major world currencies
    ("USD", "/static/images/flags/us.svg", "US Dollar", "United States"),
    ("EUR", "/static/images/flags/eu.svg", "Euro", "European Union"),
    ("GBP", "/static/images/flags/gb.svg", "British Pound", "United Kingdom"),
    ("JPY", "/static/images/flags/jp.svg", "Japanese Yen", "Japan"),
    ("CHF", "/static/images/flags/ch.svg", "Swiss Franc", "Switzerland"),
    ("CAD", "/static/images/flags/ca.svg", "Canadian Dollar", "Canada"),
    ("AUD", "/static/images/flags/au.svg", "Australian Dollar", "Australia"),
    ("NZD", "/static/images/flags/nz.svg", "New Zealand Dollar", "New Zealand"),
    ("CNY", "/static/images/flags/cn.svg", "Chinese Yuan Renminbi", "China"),
    ("HKD", "/static/images/flags/hk.svg", "Hong Kong Dollar", "Hong Kong"),
    ("SGD", "/static/images/flags/sg.svg", "Singapore Dollar", "Singapore"),
    ("INR", "/static/images/flags/in.svg", "Indian Rupee", "India"),
    ("RUB", "/static/images/flags/ru.svg", "Russian Ruble", "Russia"),
    ("BRL", "/static/images/flags/br.svg", "Brazilian Real", "Brazil"),
    ("MXN", "/static/images/flags/mx.svg", "Mexican Peso", "Mexico"),
    ("SEK", "/static/images/flags/se.svg", "Swedish Krona", "Sweden"),
    ("NOK", "/static/images/flags/no.svg", "Norwegian Krone", "Norway"),
    ("DKK", "/static/images/flags/dk.svg", "Danish Krone", "Denmark"),
    ("PLN", "/static/images/flags/pl.svg", "Polish Zloty", "Poland"),
    ("TRY", "/static/images/flags/tr.svg", "Turkish Lira", "Turkey"),
    // North Africa
    ("DZD", "/static/images/flags/dz.svg", "Algerian Dinar", "Algeria"),
    ("EGP", "/static/images/flags/eg.svg", "Egyptian Pound", "Egypt"),
    ("LYD", "/static/images/flags/ly.svg", "Libyan Dinar", "Libya"),
    ("MAD", "/static/images/flags/ma.svg", "Moroccan Dirham", "Morocco"),
    ("SDG", "/static/images/flags/sd.svg", "Sudanese Pound", "Sudan"),
    ("TND", "/static/images/flags/tn.svg", "Tunisian Dinar", "Tunisia"),
    // West Africa
    ("NGN", "/static/images/flags/ng.svg", "Nigerian Naira", "Nigeria"),
    ("GHS", "/static/images/flags/gh.svg", "Ghanaian Cedi", "Ghana"),
    ("XOF", "/static/images/flags/sn.svg", "CFA Franc BCEAO", "BCEAO"),
    ("GMD", "/static/images/flags/gm.svg", "Gambian Dalasi", "Gambia"),
    ("GNF", "/static/images/flags/gn.svg", "Guinean Franc", "Guinea"),
    ("LRD", "/static/images/flags/lr.svg", "Liberian Dollar", "Liberia"),
    ("SLL", "/static/images/flags/sl.svg", "Sierra Leonean Leone", "Sierra Leone"),
    ("SLE", "/static/images/flags/sl.svg", "Sierra Leonean Leone (new)", "Sierra Leone"),
    ("CVE", "/static/images/flags/cv.svg", "Cape Verdean Escudo", "Cape Verde"),
    // Central Africa
    ("XAF", "/static/images/flags/cm.svg", "CFA Franc BEAC", "BEAC"),
    ("CDF", "/static/images/flags/cd.svg", "Congolese Franc", "DR Congo"),
    ("STN", "/static/images/flags/st.svg", "São Tomé and Príncipe Dobra", "São Tomé and Príncipe"),
    // East Africa
    ("KES", "/static/images/flags/ke.svg", "Kenyan Shilling", "Kenya"),
    ("ETB", "/static/images/flags/et.svg", "Ethiopian Birr", "Ethiopia"),
    ("UGX", "/static/images/flags/ug.svg", "Ugandan Shilling", "Uganda"),
    ("TZS", "/static/images/flags/tz.svg", "Tanzanian Shilling", "Tanzania"),
    ("RWF", "/static/images/flags/rw.svg", "Rwandan Franc", "Rwanda"),
    ("BIF", "/static/images/flags/bi.svg", "Burundian Franc", "Burundi"),
    ("DJF", "/static/images/flags/dj.svg", "Djiboutian Franc", "Djibouti"),
    ("ERN", "/static/images/flags/er.svg", "Eritrean Nakfa", "Eritrea"),
    ("SSP", "/static/images/flags/ss.svg", "South Sudanese Pound", "South Sudan"),
    ("SOS", "/static/images/flags/so.svg", "Somali Shilling", "Somalia"),
    // Southern Africa
    ("ZAR", "/static/images/flags/za.svg", "South African Rand", "South Africa"),
    ("LSL", "/static/images/flags/ls.svg", "Lesotho Loti", "Lesotho"),
    ("NAD", "/static/images/flags/na.svg", "Namibian Dollar", "Namibia"),
    ("SZL", "/static/images/flags/sz.svg", "Swazi Lilangeni", "Eswatini"),
    ("BWP", "/static/images/flags/bw.svg", "Botswana Pula", "Botswana"),
    ("ZMW", "/static/images/flags/zm.svg", "Zambian Kwacha", "Zambia"),
    ("MWK", "/static/images/flags/mw.svg", "Malawian Kwacha", "Malawi"),
    ("ZWL", "/static/images/flags/zw.svg", "Zimbabwean Dollar", "Zimbabwe"),
    ("MZN", "/static/images/flags/mz.svg", "Mozambican Metical", "Mozambique"),
    ("MGA", "/static/images/flags/mg.svg", "Malagasy Ariary", "Madagascar"),
    ("SCR", "/static/images/flags/sc.svg", "Seychellois Rupee", "Seychelles"),
    ("MUR", "/static/images/flags/mu.svg", "Mauritian Rupee", "Mauritius"),
    ("AOA", "/static/images/flags/ao.svg", "Angolan Kwanza", "Angola"),
    // Crypto
    ("BTC", CRYPTO_ICON, "Bitcoin", GLOBAL_COUNTRY),
    ("ETH", CRYPTO_ICON, "Ethereum", GLOBAL_COUNTRY),
    ("USDT", CRYPTO_ICON, "Tether", GLOBAL_COUNTRY),
    ("BNB", CRYPTO_ICON, "Binance Coin", GLOBAL_COUNTRY),
    ("SOL", CRYPTO_ICON, "Solana", GLOBAL_COUNTRY),
    ("XRP", CRYPTO_ICON, "XRP (Ripple)", GLOBAL_COUNTRY),
    ("USDC", CRYPTO_ICON, "USD Coin", GLOBAL_COUNTRY),
    ("ADA", CRYPTO_ICON, "Cardano", GLOBAL_COUNTRY),
    ("AVAX", CRYPTO_ICON, "Avalanche", GLOBAL_COUNTRY),
    ("DOGE", CRYPTO_ICON, "Dogecoin", GLOBAL_COUNTRY),
    ("DOT", CRYPTO_ICON, "Polkadot", GLOBAL_COUNTRY),
    ("MATIC", CRYPTO_ICON, "Polygon", GLOBAL_COUNTRY),
    ("LTC", CRYPTO_ICON, "Litecoin", GLOBAL_COUNTRY),
    ("SHIB", CRYPTO_ICON, "Shiba Inu", GLOBAL_COUNTRY),
    ("DAI", CRYPTO_ICON, "Dai", GLOBAL_COUNTRY),
    ("TRX", CRYPTO_ICON, "TRON", GLOBAL_COUNTRY),
    ("UNI", CRYPTO_ICON, "Uniswap", GLOBAL_COUNTRY),
    ("LINK", CRYPTO_ICON, "Chainlink", GLOBAL_COUNTRY),
    ("ATOM", CRYPTO_ICON, "Cosmos", GLOBAL_COUNTRY),
    ("XMR", CRYPTO_ICON, "Monero", GLOBAL_COUNTRY),
];

static DESCRIPTORS: LazyLock<FnvHashMap<&'static str, CurrencyDescriptor>> = LazyLock::new(|| {
    TABLE
        .iter()
        .map(|(code, icon, name, country)| {
            (
                *code,
                CurrencyDescriptor {
                    code: SmolStr::new_static(*code),
                    display_name: name.to_string(),
                    country_label: country.to_string(),
                    icon_ref: icon.to_string(),
                },
            )
        })
        .collect()
});

/// Look up the [`CurrencyDescriptor`] for `code`.
///
/// Codes are matched exactly as the server sends them (upper case). Unknown codes
/// yield [`CurrencyDescriptor::global`].
pub fn lookup(code: &str) -> CurrencyDescriptor {
    DESCRIPTORS
        .get(code)
        .cloned()
        .unwrap_or_else(|| CurrencyDescriptor::global(code))
}

/// Whether `code` has a dedicated entry in the table.
pub fn is_known(code: &str) -> bool {
    DESCRIPTORS.contains_key(code)
}

/// Number of codes in the table.
pub fn known_count() -> usize {
    TABLE.len()
}
