// servitor/examples/stages_and_failures.rs

use servitor::{attr, Condition, Failure, ServiceBuilder, Step, StepControl, Value, ValueType};
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
enum GatewayError {
  #[error("card declined: {0}")]
  Declined(String),
}

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Stages and Failures Example ---");

  let checkout = ServiceBuilder::new("Checkout")
    .input(attr("amount").types(ValueType::Integer).min(1))
    .input(attr("card").types(ValueType::String))
    .input(attr("gift").types(ValueType::Boolean).optional().default(false))
    .internal(attr("reserved").types(ValueType::Boolean))
    .output(attr("status").types(ValueType::String).required(true))
    .output(attr("wrapped").types(ValueType::Boolean))
    .fail_on::<GatewayError>(|e| match e {
      GatewayError::Declined(reason) => format!("Payment declined ({})", reason),
    })
    .make("check_amount", |ctx| {
      if ctx.input("amount")?.as_i64().unwrap_or_default() > 10_000 {
        return ctx.fail(Failure::new("Amount needs manual approval").of_type("review"));
      }
      Ok(StepControl::Continue)
    })
    .stage(|stage| {
      stage
        .wrap_in(|ctx, proceed| {
          info!("Opening transaction.");
          let result = proceed(ctx);
          info!(ok = result.is_ok(), "Closing transaction.");
          result
        })
        .rollback(|ctx, err| {
          error!(%err, "Charge failed; releasing reservation.");
          ctx.set_internal("reserved", false)?;
          Err(Failure::new(err.to_string()).of_type("payment").into())
        })
        .make("reserve_stock", |ctx| {
          ctx.set_internal("reserved", true)?;
          Ok(StepControl::Continue)
        })
        .make("charge_card", |ctx| {
          match ctx.input("card")?.as_str() {
            Some("declined") => Err(GatewayError::Declined("insufficient funds".to_string()).into()),
            _ => Ok(StepControl::Continue),
          }
        });
    })
    .make_step(
      Step::new("wrap_gift", |ctx| {
        ctx.set_output("wrapped", true)?;
        Ok(StepControl::Continue)
      })
      .only_if(Condition::when(|ctx| ctx.input("gift").map_or(false, Value::query))),
    )
    .make("confirm", |ctx| {
      ctx.set_output("status", "confirmed")?;
      ctx.success()
    })
    .make("send_survey", |_| {
      info!("Not reached: `confirm` ends the call.");
      Ok(StepControl::Continue)
    })
    .build()?;

  for (card, amount, gift) in [("ok", 250, true), ("declined", 250, false), ("ok", 50_000, false)] {
    let outcome = checkout.call([
      ("card", Value::from(card)),
      ("amount", Value::from(amount)),
      ("gift", Value::from(gift)),
    ])?;
    outcome
      .on_success(|outputs| info!(status = ?outputs.get("status"), wrapped = ?outputs.get("wrapped"), "Checkout done."))
      .on_failure_of("payment", |e| error!(message = %e.message(), "Payment failed."))
      .on_failure_of("review", |e| info!(message = %e.message(), "Sent to review."));
  }

  // Input errors never reach the steps.
  let rejected = checkout.call([("card", "ok"), ("amount", "250")])?;
  info!(?rejected, "Rejected before running.");

  Ok(())
}
