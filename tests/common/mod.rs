//! Shared fixtures for integration tests

#![allow(dead_code)]

use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use laptop_catalog::auth::{catalog_policy, TokenService};
use laptop_catalog::client::{AuthClient, CredentialInterceptor, InterceptorConfig, LaptopClient};
use laptop_catalog::models::{
    Cpu, Gpu, Keyboard, KeyboardLayout, Laptop, Memory, MemoryUnit, Panel, Resolution, Screen,
    Storage, StorageDriver, Weight,
};
use laptop_catalog::store::{seed_users, ImageStore};
use laptop_catalog::{CatalogServer, Stores};

pub const SECRET: &str = "integration-test-secret-of-at-least-32-chars";

fn pick<'a>(rng: &mut impl Rng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// A random but well-formed laptop with a fresh id
pub fn sample_laptop() -> Laptop {
    let mut rng = rand::thread_rng();
    let brand = pick(&mut rng, &["Apple", "Dell", "Lenovo"]);
    let name = match brand {
        "Apple" => pick(&mut rng, &["Macbook Air", "Macbook Pro"]),
        "Dell" => pick(&mut rng, &["Latitude", "Vostro", "XPS", "Alienware"]),
        _ => pick(&mut rng, &["Thinkpad X1", "Thinkpad P1", "Thinkpad P53"]),
    };

    let cores = rng.gen_range(2..=8);
    let min_ghz = rng.gen_range(2.0..3.5);
    let gpu_min_ghz = rng.gen_range(1.0..1.5);

    Laptop {
        id: Uuid::new_v4().to_string(),
        brand: brand.to_string(),
        name: name.to_string(),
        cpu: Cpu {
            brand: pick(&mut rng, &["Intel", "AMD"]).to_string(),
            name: pick(&mut rng, &["Core i7-9750H", "Ryzen 7 PRO 2700U"]).to_string(),
            number_cores: cores,
            number_threads: rng.gen_range(cores..=12),
            min_ghz,
            max_ghz: rng.gen_range(min_ghz..5.0),
        },
        ram: Memory::new(rng.gen_range(4..=64), MemoryUnit::Gigabyte),
        gpus: vec![Gpu {
            brand: pick(&mut rng, &["Nvidia", "AMD"]).to_string(),
            name: pick(&mut rng, &["RTX 2060", "GTX 1660-Ti", "RX 590"]).to_string(),
            min_ghz: gpu_min_ghz,
            max_ghz: rng.gen_range(gpu_min_ghz..2.0),
            memory: Memory::new(rng.gen_range(2..=6), MemoryUnit::Gigabyte),
        }],
        storages: vec![
            Storage {
                driver: StorageDriver::Ssd,
                memory: Memory::new(rng.gen_range(128..=1024), MemoryUnit::Gigabyte),
            },
            Storage {
                driver: StorageDriver::Hdd,
                memory: Memory::new(rng.gen_range(1..=6), MemoryUnit::Terabyte),
            },
        ],
        screen: Screen {
            size_inch: rng.gen_range(13.0..17.0),
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            panel: if rng.gen_bool(0.5) { Panel::Ips } else { Panel::Oled },
            multitouch: rng.gen_bool(0.5),
        },
        keyboard: Keyboard {
            layout: *[KeyboardLayout::Qwerty, KeyboardLayout::Qwertz, KeyboardLayout::Azerty]
                .choose(&mut rng)
                .unwrap(),
            backlit: rng.gen_bool(0.5),
        },
        weight: Weight::Kg(rng.gen_range(1.0..3.0)),
        price_usd: rng.gen_range(1500.0..3500.0),
        release_year: rng.gen_range(2015..=2019),
        updated_at: Some(chrono::Utc::now()),
    }
}

/// Server with seeded users, writing images under `image_dir`
pub async fn start_server(image_dir: &Path) -> Arc<CatalogServer> {
    let tokens = TokenService::new(SECRET, laptop_catalog::auth::DEFAULT_TOKEN_TTL).unwrap();
    let stores = Stores::new(ImageStore::open(image_dir).await.unwrap());
    seed_users(&stores.users).await.unwrap();
    Arc::new(CatalogServer::new(tokens, catalog_policy(), stores))
}

/// Laptop client logged in as `username`
pub async fn client_for(server: &Arc<CatalogServer>, username: &str) -> LaptopClient {
    let login = Arc::new(AuthClient::new(Arc::clone(server), username, "secret"));
    let interceptor = CredentialInterceptor::new(login, InterceptorConfig::default())
        .await
        .unwrap();
    LaptopClient::new(Arc::clone(server), Arc::new(interceptor))
}
