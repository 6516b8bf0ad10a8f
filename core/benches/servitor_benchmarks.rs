use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use servitor::{attr, Schema, SchemaField, Service, ServiceBuilder, StepControl, Value, ValueType};

// --- Helper: a service with `num_steps` trivial steps ---
fn create_counting_service(num_steps: usize) -> Service {
  let mut builder = ServiceBuilder::new("Counter")
    .input(attr("start").types(ValueType::Integer))
    .internal(attr("count").types(ValueType::Integer))
    .output(attr("count").types(ValueType::Integer).required(true).min(0))
    .make("seed", |ctx| {
      let start = ctx.input("start")?.clone();
      ctx.set_internal("count", start)?;
      Ok(StepControl::Continue)
    });

  for i in 0..num_steps {
    builder = builder.make(format!("step_{}", i), |ctx| {
      let next = ctx.internal("count")?.as_i64().unwrap_or_default().wrapping_add(1);
      ctx.set_internal("count", next)?;
      Ok(StepControl::Continue)
    });
  }

  builder
    .make("publish", |ctx| {
      let count = ctx.internal("count")?.clone();
      ctx.set_output("count", count)?;
      Ok(StepControl::Continue)
    })
    .build()
    .expect("benchmark service builds")
}

// --- Helper: a service whose cost is dominated by input validation ---
fn create_validating_service() -> Service {
  let address = Schema::new()
    .field("street", SchemaField::new(ValueType::String))
    .field("city", SchemaField::new(ValueType::String))
    .field("zip", SchemaField::new(ValueType::String).optional().default("00000"));

  ServiceBuilder::new("Signup")
    .input(attr("email").types(ValueType::String).format("email"))
    .input(attr("age").types(ValueType::Integer).min(18).max(130))
    .input(attr("plan").types(ValueType::String).inclusion(vec!["free", "pro", "team"]))
    .input(attr("tags").types(ValueType::Array).consists_of(ValueType::String))
    .input(attr("address").types(ValueType::Hash).schema(address))
    .output(attr("accepted").types(ValueType::Boolean))
    .make("accept", |ctx| {
      ctx.set_output("accepted", true)?;
      Ok(StepControl::Continue)
    })
    .build()
    .expect("benchmark service builds")
}

fn signup_arguments(num_tags: usize) -> Vec<(&'static str, Value)> {
  vec![
    ("email", Value::from("ann@example.com")),
    ("age", Value::from(34)),
    ("plan", Value::from("pro")),
    ("tags", Value::array((0..num_tags).map(|i| format!("tag_{}", i)))),
    (
      "address",
      Value::hash([("street", "Main St 1"), ("city", "Oslo")]),
    ),
  ]
}

// --- Benchmark Functions ---

fn bench_step_chain(c: &mut Criterion) {
  let mut group = c.benchmark_group("StepChain");

  for num_steps in [1usize, 10, 50].iter() {
    let service = create_counting_service(*num_steps);
    group.throughput(Throughput::Elements(*num_steps as u64));
    group.bench_with_input(BenchmarkId::from_parameter(num_steps), num_steps, |b, _| {
      b.iter(|| {
        let outcome = service.call([("start", 0)]).expect("call succeeds");
        criterion::black_box(outcome)
      });
    });
  }
  group.finish();
}

fn bench_input_validation(c: &mut Criterion) {
  let mut group = c.benchmark_group("InputValidation");
  let service = create_validating_service();

  for num_tags in [0usize, 10, 100].iter() {
    let arguments = signup_arguments(*num_tags);
    group.bench_with_input(BenchmarkId::new("tags", num_tags), &arguments, |b, arguments| {
      b.iter(|| {
        let outcome = service
          .call(arguments.iter().cloned().collect::<servitor::Arguments>())
          .expect("call succeeds");
        criterion::black_box(outcome)
      });
    });
  }
  group.finish();
}

fn bench_service_build(c: &mut Criterion) {
  c.bench_function("ServiceBuild/validating", |b| {
    b.iter(|| criterion::black_box(create_validating_service()));
  });
}

criterion_group!(benches, bench_step_chain, bench_input_validation, bench_service_build);
criterion_main!(benches);
