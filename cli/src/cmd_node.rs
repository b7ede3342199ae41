//! `node-info`, `chain-id` and `fork-origin`.

use anyhow::{Context, Result};
use stackwatch_core::StackRecord;
use stackwatch_node::{
    chain_name, get_chain_id, get_node_info, ForkOrigin, ForkOriginResolver, HttpConnector,
    NodeIntrospection,
};

pub async fn node_info(stack: &StackRecord, as_json: bool) -> Result<()> {
    let info = get_node_info(&stack.rpc_url)
        .await
        .with_context(|| format!("anvil_nodeInfo on {}", stack.rpc_url))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", describe(&stack.slug, &info));
    }
    Ok(())
}

fn describe(slug: &str, info: &NodeIntrospection) -> String {
    let env = &info.environment;
    let mut out = format!(
        "Stack:       {slug}\n\
         Block:       {} @ {}\n\
         Block hash:  {}\n\
         Hardfork:    {}\n\
         Tx order:    {}\n\
         Chain id:    {}\n\
         Base fee:    {}\n\
         Gas price:   {}\n\
         Gas limit:   {}\n",
        info.current_block_number,
        info.current_block_timestamp,
        info.current_block_hash,
        info.hard_fork,
        info.transaction_order,
        env.chain_id,
        env.base_fee,
        env.gas_price,
        env.gas_limit,
    );
    match &info.fork_config {
        Some(fork) => out.push_str(&format!(
            "Forked from: {} at block {}\n",
            fork.fork_url, fork.fork_block_number
        )),
        None => out.push_str("Forked from: -\n"),
    }
    out
}

pub async fn chain_id(url: &str) -> Result<()> {
    let id = get_chain_id(url)
        .await
        .with_context(|| format!("eth_chainId on {url}"))?;
    println!("{id} ({id:#x}) {}", chain_name(u64::from(id)));
    Ok(())
}

pub async fn fork_origin(stack: &StackRecord) -> Result<()> {
    let fork_url = match stack.fork_url() {
        Some(url) => Some(url.to_string()),
        None => get_node_info(&stack.rpc_url)
            .await
            .with_context(|| format!("anvil_nodeInfo on {}", stack.rpc_url))?
            .fork_url()
            .map(str::to_string),
    };

    let resolver = ForkOriginResolver::new(HttpConnector::default());
    let origin = resolver
        .resolve(&stack.slug, fork_url.as_deref())
        .await
        .context("resolving fork origin")?;

    match origin {
        ForkOrigin::NotApplicable => println!("{} is not a fork", stack.slug),
        ForkOrigin::ChainId(id) => println!(
            "{} is forked from {} (chain {id})",
            stack.slug,
            chain_name(u64::from(id))
        ),
    }
    Ok(())
}
