use adm_feed::{InviteCode, Invitation, NewInviteCode};
use adm_reconcile::Collection;
use anyhow::Result;

use super::connect;

pub async fn codes(config_paths: &[String]) -> Result<()> {
    let (_, client) = connect(config_paths)?;
    let codes = client.list_invite_codes().await?;
    for c in &codes {
        println!("{}", code_line(c));
    }
    println!("codes={}", codes.len());
    Ok(())
}

pub async fn invitations(config_paths: &[String], limit: u32) -> Result<()> {
    let (_, client) = connect(config_paths)?;
    let list = Collection::from_records(client.list_invitations(limit).await?);
    for i in list.iter() {
        println!("{}", invitation_line(i));
    }
    println!("invitations={}", list.len());
    Ok(())
}

pub async fn create(
    config_paths: &[String],
    code: &str,
    max_uses: u32,
    description: Option<&str>,
) -> Result<()> {
    let req = NewInviteCode::new(code, max_uses, description)?;
    let (_, client) = connect(config_paths)?;
    client.create_invite_code(&req).await?;
    println!("code={} max_uses={}", req.code, req.max_uses);
    Ok(())
}

fn code_line(c: &InviteCode) -> String {
    let uses = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
    format!(
        "{}\tused={}/{}\tremaining={}\t{}{}",
        c.code,
        uses(c.current_uses),
        uses(c.max_uses),
        uses(c.remaining_uses),
        c.created_at,
        if c.is_exhausted() { "\texhausted" } else { "" }
    )
}

fn invitation_line(i: &Invitation) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        i.invited_at,
        i.invite_code,
        i.inviter_user_id,
        i.invitee_user_id.as_deref().unwrap_or("-"),
        if i.invitee_phone.is_empty() { "-" } else { &i.invitee_phone }
    )
}
