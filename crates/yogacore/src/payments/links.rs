use strum::{AsRefStr, Display, EnumString};
use url::Url;

use crate::config::PaymentConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    #[strum(serialize = "paypal")]
    PayPal,
    BankTransfer,
}

/// External checkout links per payment method
#[derive(Debug, Clone)]
pub struct PaymentLinks {
    card: Url,
    paypal: Option<Url>,
    bank_transfer: Option<Url>,
}

impl PaymentLinks {
    pub fn from_config(config: &PaymentConfig) -> Self {
        Self {
            card: config.card_url.clone(),
            paypal: config.paypal_url.clone(),
            bank_transfer: config.bank_transfer_url.clone(),
        }
    }

    /// Links offered for a plan, in display order. Unconfigured methods are skipped.
    ///
    /// Card and PayPal links carry `telegram_id` and `plan_id` so the
    /// processor can relate the payment to the chat.
    pub fn for_plan(&self, plan_id: i64, telegram_id: i64) -> Vec<(PaymentMethod, Url)> {
        let tagged = |base: &Url| {
            let mut url = base.clone();
            url.query_pairs_mut()
                .append_pair("telegram_id", &telegram_id.to_string())
                .append_pair("plan_id", &plan_id.to_string());
            url
        };

        let mut links = vec![(PaymentMethod::Card, tagged(&self.card))];
        if let Some(paypal) = &self.paypal {
            links.push((PaymentMethod::PayPal, tagged(paypal)));
        }
        if let Some(bank) = &self.bank_transfer {
            links.push((PaymentMethod::BankTransfer, bank.clone()));
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(paypal: Option<&str>, bank: Option<&str>) -> PaymentConfig {
        PaymentConfig {
            card_url: Url::parse("https://payform.ru/iw4eY7T/").unwrap(),
            paypal_url: paypal.map(|u| Url::parse(u).unwrap()),
            bank_transfer_url: bank.map(|u| Url::parse(u).unwrap()),
            webhook_secret: None,
        }
    }

    #[test]
    fn card_link_is_tagged() {
        let links = PaymentLinks::from_config(&config(None, None)).for_plan(2, 555);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].0, PaymentMethod::Card);
        assert_eq!(links[0].1.as_str(), "https://payform.ru/iw4eY7T/?telegram_id=555&plan_id=2");
    }

    #[test]
    fn optional_methods_follow_config() {
        let links = PaymentLinks::from_config(&config(
            Some("https://www.paypal.com/checkout?ref=yoga"),
            Some("https://club.example.com/bank"),
        ))
        .for_plan(1, 7);

        let methods: Vec<_> = links.iter().map(|(m, _)| *m).collect();
        assert_eq!(methods, vec![PaymentMethod::Card, PaymentMethod::PayPal, PaymentMethod::BankTransfer]);
        assert_eq!(links[1].1.as_str(), "https://www.paypal.com/checkout?ref=yoga&telegram_id=7&plan_id=1");
        assert_eq!(links[2].1.as_str(), "https://club.example.com/bank");
    }

    #[test]
    fn method_names() {
        assert_eq!(PaymentMethod::PayPal.as_ref(), "paypal");
        assert_eq!(PaymentMethod::BankTransfer.as_ref(), "bank_transfer");
    }
}
